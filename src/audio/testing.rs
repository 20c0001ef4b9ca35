//! In-memory output used by engine and session tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::EngineError;
use super::output::{AudioOutput, OpenedSink, SinkStatus, TrackSink, classify_end};

#[derive(Debug)]
pub(crate) struct FakeSinkState {
    pub path: PathBuf,
    pub playing: bool,
    pub stopped: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub status: SinkStatus,
}

#[derive(Default)]
struct FakeInner {
    sinks: Vec<Arc<Mutex<FakeSinkState>>>,
    undecodable: Vec<PathBuf>,
    durations: HashMap<PathBuf, Duration>,
}

/// Cloneable handle to a fake output; clones share state.
#[derive(Clone, Default)]
pub(crate) struct FakeOutput {
    inner: Arc<Mutex<FakeInner>>,
}

impl FakeOutput {
    pub fn reject_decode(&self, path: &Path) {
        self.inner.lock().unwrap().undecodable.push(path.to_path_buf());
    }

    pub fn set_duration(&self, path: &Path, duration: Duration) {
        self.inner
            .lock()
            .unwrap()
            .durations
            .insert(path.to_path_buf(), duration);
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        let inner = self.inner.lock().unwrap();
        inner
            .sinks
            .iter()
            .map(|s| s.lock().unwrap().path.clone())
            .collect()
    }

    /// Sinks that were opened and not stopped yet.
    pub fn live_sinks(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .sinks
            .iter()
            .filter(|s| !s.lock().unwrap().stopped)
            .count()
    }

    fn last(&self) -> Arc<Mutex<FakeSinkState>> {
        self.inner
            .lock()
            .unwrap()
            .sinks
            .last()
            .cloned()
            .expect("no sink opened")
    }

    pub fn is_current_playing(&self) -> bool {
        self.last().lock().unwrap().playing
    }

    pub fn finish_current(&self) {
        self.last().lock().unwrap().status = SinkStatus::Finished;
    }

    /// The stream runs dry at `at`, classified the way the rodio sink does it.
    pub fn end_current_at(&self, at: Duration) {
        let sink = self.last();
        let mut s = sink.lock().unwrap();
        s.position = at;
        s.status = classify_end(at, s.duration);
    }

    pub fn fail_current(&self, reason: &str) {
        self.last().lock().unwrap().status = SinkStatus::Failed(reason.to_string());
    }

    /// Let wall-clock time pass: playing sinks advance, paused ones do not.
    pub fn advance(&self, by: Duration) {
        let inner = self.inner.lock().unwrap();
        for sink in &inner.sinks {
            let mut s = sink.lock().unwrap();
            if s.playing && !s.stopped {
                s.position += by;
            }
        }
    }
}

impl AudioOutput for FakeOutput {
    fn open_sink(&mut self, path: &Path) -> Result<OpenedSink, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.undecodable.iter().any(|p| p == path) {
            return Err(EngineError::PrepareFailed(format!("{}: unrecognized format", path.display())));
        }

        let duration = inner.durations.get(path).copied();
        let state = Arc::new(Mutex::new(FakeSinkState {
            path: path.to_path_buf(),
            playing: false,
            stopped: false,
            position: Duration::ZERO,
            duration,
            status: SinkStatus::Active,
        }));
        inner.sinks.push(state.clone());

        Ok(OpenedSink {
            sink: Box::new(FakeSink(state)),
            duration,
        })
    }
}

struct FakeSink(Arc<Mutex<FakeSinkState>>);

impl TrackSink for FakeSink {
    fn play(&self) {
        self.0.lock().unwrap().playing = true;
    }

    fn pause(&self) {
        self.0.lock().unwrap().playing = false;
    }

    fn stop(&self) {
        let mut s = self.0.lock().unwrap();
        s.playing = false;
        s.stopped = true;
    }

    fn try_seek(&self, position: Duration) -> Result<(), String> {
        self.0.lock().unwrap().position = position;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.0.lock().unwrap().position
    }

    fn status(&self) -> SinkStatus {
        self.0.lock().unwrap().status.clone()
    }
}
