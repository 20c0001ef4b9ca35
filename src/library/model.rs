use std::fmt;
use std::path::PathBuf;

use crate::audio::Millis;

/// Duration assumed when a file's length cannot be read.
pub const UNKNOWN_DURATION_MS: Millis = 180_000;
/// Artist shown when a file carries no artist tag.
pub const UNKNOWN_ARTIST: &str = "Unknown artist";
/// Imported tracks are numbered from here so they never collide with built-ins.
pub const FIRST_IMPORTED_ID: u32 = 100;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the audio for a track comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// A resource shipped with the player, referenced by name.
    BuiltIn(String),
    /// A file on disk.
    File(PathBuf),
}

/// One playable item. Never mutated; a catalog refresh replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub duration_ms: Millis,
    pub source: TrackSource,
}

impl Track {
    /// Identity used to find a track again in a refreshed playlist.
    pub fn same_identity(&self, other: &Track) -> bool {
        self.id == other.id && self.title == other.title
    }

    /// "Artist - Title", or just the title when the artist is blank.
    pub fn display(&self) -> String {
        match self.artist.trim() {
            "" => self.title.clone(),
            artist => format!("{} - {}", artist, self.title),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.source, TrackSource::BuiltIn(_))
    }
}
