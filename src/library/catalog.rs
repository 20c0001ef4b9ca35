use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{BuiltinTrack, LibrarySettings};

use super::import::ImportError;
use super::model::{FIRST_IMPORTED_ID, Track, TrackId, TrackSource, UNKNOWN_DURATION_MS};
use super::scan::{collect_audio_files, read_track_metadata};
use super::store::{ImportRecord, ImportStore};

const STORAGE_DIR: &str = "imported_music";
const RECORDS_FILE: &str = "imported_music.json";

/// What the playback session and the UI need from a track source.
pub trait TrackCatalog {
    /// The full ordered track list. Stable until the next call.
    fn load_catalog(&self) -> Vec<Track>;

    /// Copy `path` into private storage and record it.
    fn import_file(&mut self, path: &Path) -> Result<Track, ImportError>;
}

/// Built-in tracks from the config followed by files imported into
/// `<data_dir>/imported_music/`.
#[derive(Debug, Clone)]
pub struct Catalog {
    builtin: Vec<BuiltinTrack>,
    settings: LibrarySettings,
    extensions: Vec<String>,
    storage_dir: PathBuf,
    store: ImportStore,
}

impl Catalog {
    pub fn new(data_dir: &Path, settings: &LibrarySettings, extensions: &[String]) -> Self {
        Self {
            builtin: settings.builtin.clone(),
            settings: settings.clone(),
            extensions: extensions.to_vec(),
            storage_dir: data_dir.join(STORAGE_DIR),
            store: ImportStore::new(data_dir.join(RECORDS_FILE)),
        }
    }

    /// Import records, each with its id assigned.
    pub fn records(&self) -> Vec<ImportRecord> {
        let mut records = self.store.load();
        if assign_missing_ids(&mut records)
            && let Err(e) = self.store.save(&records)
        {
            warn!(path = %self.store.path().display(), error = %e, "cannot persist assigned track ids");
        }
        records
    }

    /// Where the import records are kept.
    pub fn records_path(&self) -> &Path {
        self.store.path()
    }

    fn builtin_tracks(&self) -> impl Iterator<Item = Track> + '_ {
        self.builtin.iter().map(|b| Track {
            id: TrackId(b.id),
            title: b.title.clone(),
            artist: b.artist.clone(),
            duration_ms: if b.duration_ms > 0 {
                b.duration_ms
            } else {
                UNKNOWN_DURATION_MS
            },
            source: TrackSource::BuiltIn(b.resource.clone()),
        })
    }

    fn imported_tracks(&self) -> Vec<Track> {
        let mut tracks = Vec::new();
        for record in self.records() {
            if let Err(e) = File::open(&record.file_path) {
                warn!(file = %record.file_name, path = %record.file_path.display(), error = %e, "skipping unreadable imported file");
                continue;
            }
            let meta = read_track_metadata(&record.file_path);
            tracks.push(Track {
                id: TrackId(record.id.unwrap_or(FIRST_IMPORTED_ID)),
                title: meta.title,
                artist: meta.artist,
                duration_ms: meta.duration_ms,
                source: TrackSource::File(record.file_path),
            });
        }
        tracks
    }

    fn is_taken(&self, file_name: &str, records: &[ImportRecord]) -> bool {
        let wanted = file_name.to_lowercase();
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase);

        records.iter().any(|r| r.file_name.to_lowercase() == wanted)
            || self.builtin.iter().any(|b| {
                let resource = b.resource.to_lowercase();
                resource == wanted || Some(&resource) == stem.as_ref()
            })
    }

    /// Import every audio file under `dir`. One result per file found.
    pub fn import_dir(&mut self, dir: &Path) -> Vec<(PathBuf, Result<Track, ImportError>)> {
        let files = collect_audio_files(dir, &self.settings, &self.extensions);
        debug!(dir = %dir.display(), count = files.len(), "importing directory");
        files
            .into_iter()
            .map(|path| {
                let result = self.import_file(&path);
                (path, result)
            })
            .collect()
    }

    /// Forget an imported file and delete its private copy.
    ///
    /// A private copy that is already gone does not stop the record from
    /// being removed.
    pub fn remove_import(&mut self, file_name: &str) -> Result<(), ImportError> {
        let mut records = self.records();
        let wanted = file_name.to_lowercase();
        let Some(pos) = records
            .iter()
            .position(|r| r.file_name.to_lowercase() == wanted)
        else {
            if self.is_taken(file_name, &[]) {
                return Err(ImportError::BuiltIn);
            }
            return Err(ImportError::NotFound(file_name.to_string()));
        };

        let record = records.remove(pos);
        match fs::remove_file(&record.file_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %record.file_path.display(), "private copy already gone");
            }
            Err(e) => {
                warn!(path = %record.file_path.display(), error = %e, "cannot delete private copy");
            }
        }

        self.store.save(&records).map_err(ImportError::Persist)?;
        info!(file = %record.file_name, "import removed");
        Ok(())
    }
}

impl TrackCatalog for Catalog {
    fn load_catalog(&self) -> Vec<Track> {
        self.builtin_tracks().chain(self.imported_tracks()).collect()
    }

    fn import_file(&mut self, path: &Path) -> Result<Track, ImportError> {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ImportError::InvalidName(path.to_path_buf()))?
            .to_string();

        let unreadable = |source: io::Error| ImportError::Unreadable {
            path: path.to_path_buf(),
            source,
        };
        let meta = fs::metadata(path).map_err(unreadable)?;
        if !meta.is_file() {
            return Err(unreadable(io::Error::other("not a regular file")));
        }
        File::open(path).map_err(unreadable)?;

        let mut records = self.records();
        if self.is_taken(&file_name, &records) {
            return Err(ImportError::Duplicate(file_name));
        }

        let dest = self.storage_dir.join(&file_name);
        let copy_failed = |source: io::Error| ImportError::CopyFailed {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(&self.storage_dir).map_err(copy_failed)?;
        fs::copy(path, &dest).map_err(copy_failed)?;

        records.push(ImportRecord {
            id: Some(next_id(&records)),
            file_name: file_name.clone(),
            file_path: dest.clone(),
            file_size: meta.len(),
        });
        if let Err(e) = self.store.save(&records) {
            let _ = fs::remove_file(&dest);
            return Err(ImportError::Persist(e));
        }
        info!(file = %file_name, size = meta.len(), "track imported");

        let source = TrackSource::File(dest);
        self.imported_tracks()
            .into_iter()
            .find(|t| t.source == source)
            .ok_or_else(|| unreadable(io::Error::other("imported copy is not readable")))
    }
}

/// One past the highest id in use, never below [`FIRST_IMPORTED_ID`].
fn next_id(records: &[ImportRecord]) -> u32 {
    records
        .iter()
        .filter_map(|r| r.id)
        .max()
        .map_or(FIRST_IMPORTED_ID, |max| max.saturating_add(1).max(FIRST_IMPORTED_ID))
}

/// Give records without an id the next free ones, in file order. Returns
/// whether anything changed.
fn assign_missing_ids(records: &mut [ImportRecord]) -> bool {
    let mut changed = false;
    for i in 0..records.len() {
        if records[i].id.is_none() {
            records[i].id = Some(next_id(records));
            changed = true;
        }
    }
    changed
}
