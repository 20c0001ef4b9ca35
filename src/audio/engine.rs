//! The engine adapter: at most one open handle, released before the next opens.

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::library::TrackSource;

use super::error::EngineError;
use super::output::{AudioOutput, SinkStatus, TrackSink};
use super::resource::ResourceResolver;
use super::types::{EngineEvent, EventSink, Millis, Ready, millis};

struct EngineHandle {
    sink: Box<dyn TrackSink>,
    generation: u64,
    duration_ms: Millis,
    started: bool,
    playing: bool,
    usable: bool,
    completed: bool,
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

/// Owns the single live playback handle and reports its events.
pub struct AudioEngine<O: AudioOutput> {
    output: O,
    resources: ResourceResolver,
    events: EventSink,
    handle: Option<EngineHandle>,
    generation: u64,
}

impl<O: AudioOutput> AudioEngine<O> {
    pub fn new(output: O, resources: ResourceResolver, events: EventSink) -> Self {
        Self {
            output,
            resources,
            events,
            handle: None,
            generation: 0,
        }
    }

    /// Release the current handle (if any) and open `source`.
    ///
    /// `duration_hint` is used when the decoder cannot tell the length of the
    /// stream. On error no handle is left open.
    pub fn open(&mut self, source: &TrackSource, duration_hint: Millis) -> Result<Ready, EngineError> {
        self.release();

        let path = self.resolve(source)?;
        let opened = self.output.open_sink(&path)?;

        self.generation += 1;
        let duration_ms = opened
            .duration
            .map(millis)
            .filter(|d| *d > 0)
            .unwrap_or(duration_hint);

        debug!(generation = self.generation, path = %path.display(), duration_ms, "engine handle opened");
        self.handle = Some(EngineHandle {
            sink: opened.sink,
            generation: self.generation,
            duration_ms,
            started: false,
            playing: false,
            usable: true,
            completed: false,
        });

        Ok(Ready {
            generation: self.generation,
            duration_ms,
        })
    }

    fn resolve(&self, source: &TrackSource) -> Result<PathBuf, EngineError> {
        match source {
            TrackSource::File(path) => {
                if !path.exists() {
                    return Err(EngineError::SourceNotFound(path.clone()));
                }
                File::open(path).map_err(|e| EngineError::SourceUnreadable {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                Ok(path.clone())
            }
            TrackSource::BuiltIn(name) => self
                .resources
                .resolve(name)
                .ok_or_else(|| EngineError::Unsupported(name.clone())),
        }
    }

    fn usable_handle(&mut self) -> Result<&mut EngineHandle, EngineError> {
        self.handle
            .as_mut()
            .filter(|h| h.usable)
            .ok_or(EngineError::NoActiveSource)
    }

    pub fn start(&mut self) -> Result<(), EngineError> {
        let handle = self.usable_handle()?;
        if !handle.playing {
            handle.sink.play();
            handle.playing = true;
            handle.started = true;
            // A drained handle reports its end again so a late resume still advances.
            handle.completed = false;
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), EngineError> {
        self.start()
    }

    pub fn pause(&mut self) {
        if let Some(handle) = self.handle.as_mut().filter(|h| h.playing) {
            handle.sink.pause();
            handle.playing = false;
        }
    }

    /// Halt output and release the handle.
    pub fn stop(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(generation = handle.generation, "engine handle released");
        }
    }

    /// Seek to `position_ms`, clamped to `[0, duration]`.
    ///
    /// Returns the applied position, or `None` when there is no usable handle.
    pub fn seek(&mut self, position_ms: i64) -> Option<Millis> {
        let handle = self.handle.as_mut().filter(|h| h.usable)?;
        let target = position_ms.clamp(0, handle.duration_ms.min(i64::MAX as u64) as i64) as Millis;
        if let Err(reason) = handle.sink.try_seek(Duration::from_millis(target)) {
            warn!(target_ms = target, %reason, "seek rejected by the output");
            return None;
        }
        Some(target)
    }

    pub fn position(&self) -> Millis {
        match &self.handle {
            Some(h) if h.started => millis(h.sink.position()).min(h.duration_ms),
            _ => 0,
        }
    }

    pub fn duration(&self) -> Millis {
        match &self.handle {
            Some(h) if h.started => h.duration_ms,
            _ => 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| h.playing && h.usable)
    }

    /// Check the live handle and emit at most one event for it.
    ///
    /// `Completed` fires once per track reaching its end; `Failed` fires once
    /// per handle, which is unusable afterwards.
    pub fn poll(&mut self) {
        let Some(handle) = self.handle.as_mut().filter(|h| h.usable) else {
            return;
        };

        match handle.sink.status() {
            SinkStatus::Active => {}
            SinkStatus::Finished => {
                if handle.playing && !handle.completed {
                    handle.completed = true;
                    handle.playing = false;
                    (self.events)(EngineEvent::Completed {
                        generation: handle.generation,
                    });
                }
            }
            SinkStatus::Failed(reason) => {
                handle.usable = false;
                handle.playing = false;
                warn!(generation = handle.generation, %reason, "engine handle failed");
                (self.events)(EngineEvent::Failed {
                    generation: handle.generation,
                    reason,
                });
            }
        }
    }
}
