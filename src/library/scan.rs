use std::path::{Path, PathBuf};

use lofty::prelude::*;
use walkdir::WalkDir;

use crate::audio::{Millis, millis};
use crate::config::LibrarySettings;

use super::model::{UNKNOWN_ARTIST, UNKNOWN_DURATION_MS};

/// Title, artist and duration read from a file's tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub duration_ms: Millis,
}

pub(crate) fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

pub fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    let exts = normalize_extensions(extensions);
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

/// Every audio file under `dir`, sorted by path.
pub fn collect_audio_files(dir: &Path, settings: &LibrarySettings, extensions: &[String]) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    if !settings.recursive {
        walker = walker.max_depth(1);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_audio_file(path, extensions))
        .collect();
    files.sort();
    files
}

/// Read tags from `path`, falling back to the file stem, [`UNKNOWN_ARTIST`]
/// and [`UNKNOWN_DURATION_MS`] for whatever is missing.
pub fn read_track_metadata(path: &Path) -> TrackMetadata {
    let mut meta = TrackMetadata {
        title: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string(),
        artist: UNKNOWN_ARTIST.to_string(),
        duration_ms: UNKNOWN_DURATION_MS,
    };

    let Ok(tagged) = lofty::read_from_path(path) else {
        return meta;
    };

    let duration = millis(tagged.properties().duration());
    if duration > 0 {
        meta.duration_ms = duration;
    }

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(v) = tag.title().filter(|v| !v.trim().is_empty()) {
            meta.title = v.trim().to_string();
        }
        if let Some(v) = tag.artist().filter(|v| !v.trim().is_empty()) {
            meta.artist = v.trim().to_string();
        }
    }

    meta
}
