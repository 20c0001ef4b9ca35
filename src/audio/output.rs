//! Backend seam between the engine and the actual audio output.

use std::path::Path;
use std::time::Duration;

use super::error::EngineError;

/// What a sink reports when polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkStatus {
    Active,
    Finished,
    Failed(String),
}

/// Slack allowed between where a stream ended and its reported duration.
const END_TOLERANCE: Duration = Duration::from_millis(1500);

/// Classify a drained stream: ending well short of a known duration means
/// the decoder gave up (corrupt or truncated data), not that the track ended.
pub(crate) fn classify_end(ended_at: Duration, duration: Option<Duration>) -> SinkStatus {
    let Some(duration) = duration.filter(|d| !d.is_zero()) else {
        return SinkStatus::Finished;
    };
    let slack = END_TOLERANCE.max(duration / 20);
    if ended_at + slack < duration {
        SinkStatus::Failed(format!(
            "stream ended early at {:.1}s of {:.1}s",
            ended_at.as_secs_f64(),
            duration.as_secs_f64()
        ))
    } else {
        SinkStatus::Finished
    }
}

/// One decoded track attached to the output, created paused.
pub trait TrackSink {
    fn play(&self);
    fn pause(&self);
    fn stop(&self);
    fn try_seek(&self, position: Duration) -> Result<(), String>;
    fn position(&self) -> Duration;
    fn status(&self) -> SinkStatus;
}

/// A freshly decoded sink plus the duration the decoder reported, if any.
pub struct OpenedSink {
    pub sink: Box<dyn TrackSink>,
    pub duration: Option<Duration>,
}

/// An audio device able to decode files into sinks.
pub trait AudioOutput {
    fn open_sink(&mut self, path: &Path) -> Result<OpenedSink, EngineError>;
}
