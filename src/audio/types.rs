//! Audio-related small types shared with the session.

use std::time::Duration;

/// Milliseconds, the unit used for positions and durations across the crate.
pub type Millis = u64;

/// Asynchronous notifications produced by the engine.
///
/// Both carry the generation of the handle that produced them so a consumer
/// can tell events of a released handle apart from the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The track reached its end.
    Completed { generation: u64 },
    /// The handle failed and is unusable until the next `open`.
    Failed { generation: u64, reason: String },
}

/// Result of a successful `open`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ready {
    pub generation: u64,
    pub duration_ms: Millis,
}

/// Callback the engine reports [`EngineEvent`]s through.
pub type EventSink = Box<dyn FnMut(EngineEvent) + Send>;

pub(crate) fn millis(d: Duration) -> Millis {
    d.as_millis().min(u128::from(Millis::MAX)) as Millis
}
