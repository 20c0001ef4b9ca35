//! `rodio` backend: one `Sink` per opened track.
//!
//! Opening decodes the file and attaches a paused `Sink` to the default
//! output stream's mixer. Seeking goes through `Sink::try_seek` and track
//! completion is observed through `Sink::empty`, with [`EndWatch`] telling a
//! natural end apart from a decoder that stopped early.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rodio::source::SeekError;
use rodio::{ChannelCount, Decoder, OutputStream, OutputStreamBuilder, Sample, SampleRate, Sink, Source};

use super::error::EngineError;
use super::output::{AudioOutput, OpenedSink, SinkStatus, TrackSink, classify_end};

const NOT_ENDED: u64 = u64::MAX;

/// Passes samples through and records the stream position (ms) at which the
/// inner source ran dry.
struct EndWatch<S> {
    inner: S,
    base: Duration,
    samples: u64,
    ended_at_ms: Arc<AtomicU64>,
}

impl<S: Source> EndWatch<S> {
    fn new(inner: S) -> (Self, Arc<AtomicU64>) {
        let ended_at_ms = Arc::new(AtomicU64::new(NOT_ENDED));
        let watch = Self {
            inner,
            base: Duration::ZERO,
            samples: 0,
            ended_at_ms: ended_at_ms.clone(),
        };
        (watch, ended_at_ms)
    }

    fn elapsed(&self) -> Duration {
        let per_second = u64::from(self.inner.sample_rate()) * u64::from(self.inner.channels());
        if per_second == 0 {
            return self.base;
        }
        self.base + Duration::from_millis(self.samples.saturating_mul(1000) / per_second)
    }
}

impl<S: Source> Iterator for EndWatch<S> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        match self.inner.next() {
            Some(sample) => {
                self.samples += 1;
                Some(sample)
            }
            None => {
                let at = self.elapsed().as_millis().min(u128::from(NOT_ENDED - 1)) as u64;
                self.ended_at_ms.store(at, Ordering::Relaxed);
                None
            }
        }
    }
}

impl<S: Source> Source for EndWatch<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> ChannelCount {
        self.inner.channels()
    }

    fn sample_rate(&self) -> SampleRate {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.inner.try_seek(pos)?;
        self.base = pos;
        self.samples = 0;
        Ok(())
    }
}

/// The default output device.
pub struct RodioOutput {
    stream: OutputStream,
}

impl RodioOutput {
    /// Open the default output stream.
    ///
    /// The stream is not `Send` on every platform, so this must run on the
    /// thread that will own the engine.
    pub fn open_default() -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::PrepareFailed(format!("no audio output device: {e}")))?;
        // rodio logs to stderr when the stream is dropped; the terminal belongs to the UI.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl AudioOutput for RodioOutput {
    fn open_sink(&mut self, path: &Path) -> Result<OpenedSink, EngineError> {
        let file = File::open(path).map_err(|e| EngineError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| EngineError::PrepareFailed(format!("{}: {e}", path.display())))?;
        let duration = source.total_duration();
        let (source, ended_at_ms) = EndWatch::new(source);

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.pause();

        Ok(OpenedSink {
            sink: Box::new(RodioSink {
                sink,
                duration,
                ended_at_ms,
            }),
            duration,
        })
    }
}

struct RodioSink {
    sink: Sink,
    duration: Option<Duration>,
    ended_at_ms: Arc<AtomicU64>,
}

impl TrackSink for RodioSink {
    fn play(&self) {
        self.sink.play();
    }

    fn pause(&self) {
        self.sink.pause();
    }

    fn stop(&self) {
        self.sink.stop();
    }

    fn try_seek(&self, position: Duration) -> Result<(), String> {
        self.sink.try_seek(position).map_err(|e| e.to_string())
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn status(&self) -> SinkStatus {
        if !self.sink.empty() {
            return SinkStatus::Active;
        }
        // Decode errors mid-stream end the source early; rodio reports them as an empty sink.
        match self.ended_at_ms.load(Ordering::Relaxed) {
            NOT_ENDED => SinkStatus::Finished,
            ms => classify_end(Duration::from_millis(ms), self.duration),
        }
    }
}
