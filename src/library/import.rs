use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },

    #[error("{} has no usable file name", .0.display())]
    InvalidName(PathBuf),

    #[error("a track named {0:?} is already in the library")]
    Duplicate(String),

    #[error("cannot copy {} into the library: {source}", path.display())]
    CopyFailed { path: PathBuf, source: io::Error },

    #[error("cannot save import records: {0}")]
    Persist(#[source] io::Error),

    #[error("built-in tracks cannot be removed")]
    BuiltIn,

    #[error("no imported track named {0:?}")]
    NotFound(String),
}
