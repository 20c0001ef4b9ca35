use thiserror::Error;

use crate::audio::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("track index {index} is out of range (playlist has {len} tracks)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The worker thread is gone; reconnecting is up to the caller.
    #[error("playback session is not running")]
    Disconnected,
}
