use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One imported file, as persisted in `imported_music.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    /// Track id, fixed at import time. Absent in files written before ids
    /// were stored; the catalog assigns and persists one on first load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub file_name: String,
    pub file_path: PathBuf,
    pub file_size: u64,
}

/// JSON file holding the list of imported records.
#[derive(Debug, Clone)]
pub struct ImportStore {
    path: PathBuf,
}

impl ImportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the records. A missing file is an empty list; a corrupt one is
    /// logged and treated as empty.
    pub fn load(&self) -> Vec<ImportRecord> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read import records");
                return Vec::new();
            }
        };

        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "import records are corrupt; ignoring them");
            Vec::new()
        })
    }

    pub fn save(&self, records: &[ImportRecord]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(records).map_err(io::Error::other)?;
        fs::write(&self.path, json)
    }
}
