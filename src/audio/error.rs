use std::path::PathBuf;

use thiserror::Error;

/// Failures of the audio engine adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A file source does not exist.
    #[error("file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// A file source exists but cannot be read.
    #[error("file not readable: {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    /// A bundled resource reference cannot be resolved.
    #[error("bundled resource not available: {0}")]
    Unsupported(String),

    /// The decoder rejected the data, or the output device is unavailable.
    #[error("failed to prepare playback: {0}")]
    PrepareFailed(String),

    /// `start`/`resume` without an open, usable handle.
    #[error("no active source")]
    NoActiveSource,
}
