use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::audio::{AudioEngine, AudioOutput, EngineEvent};
use crate::library::{Track, TrackId};

use super::command::Command;
use super::error::SessionError;
use super::observer::{Observers, SessionObserver, SubscriptionId};
use super::snapshot::{PlaybackState, Progress, SessionUpdate, Snapshot};
use super::surface::{Presentation, SessionSurface};
use super::timer::ProgressTimer;

/// The playback state machine. Not thread-safe on its own; see
/// [`SessionService`](super::SessionService) for the threaded wrapper.
pub struct PlaybackSession<O: AudioOutput> {
    engine: AudioEngine<O>,
    surface: Box<dyn SessionSurface>,
    surface_live: bool,
    observers: Observers,
    timer: ProgressTimer,

    playlist: Vec<Track>,
    cursor: Option<usize>,
    /// The cursor no longer points at the loaded track (it vanished from the
    /// playlist); next/previous restart from the first entry.
    unparented: bool,
    current: Option<Track>,
    state: PlaybackState,
    /// Generation of the engine handle owned by `current`.
    generation: Option<u64>,

    last_published: Option<(Option<TrackId>, PlaybackState)>,
}

impl<O: AudioOutput> PlaybackSession<O> {
    pub fn new(engine: AudioEngine<O>, surface: Box<dyn SessionSurface>, poll_interval: Duration) -> Self {
        Self {
            engine,
            surface,
            surface_live: false,
            observers: Observers::default(),
            timer: ProgressTimer::new(poll_interval),
            playlist: Vec::new(),
            cursor: None,
            unparented: false,
            current: None,
            state: PlaybackState::Idle,
            generation: None,
            last_published: None,
        }
    }

    pub fn apply(&mut self, command: Command) -> Result<(), SessionError> {
        debug!(command = command.name(), "session command");
        match command {
            Command::PlayAt(index) => self.play_at(index),
            Command::PlayNext => self.play_next(),
            Command::PlayPrevious => self.play_previous(),
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::Resume => self.resume(),
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::Seek(position_ms) => {
                self.seek(position_ms);
                Ok(())
            }
            Command::SetPlaylist(tracks) => {
                self.set_playlist(tracks);
                Ok(())
            }
            Command::BeginSeekDrag => {
                self.begin_seek_drag();
                Ok(())
            }
            Command::EndSeekDrag(position_ms) => {
                self.end_seek_drag(position_ms, Instant::now());
                Ok(())
            }
        }
    }

    // ---- accessors ----

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_unparented(&self) -> bool {
        self.unparented
    }

    pub fn playlist(&self) -> &[Track] {
        &self.playlist
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn engine(&self) -> &AudioEngine<O> {
        &self.engine
    }

    pub fn timer(&self) -> &ProgressTimer {
        &self.timer
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            track: self.current.clone(),
            cursor: self.cursor,
            state: self.state.clone(),
            position_ms: self.engine.position(),
            duration_ms: self.engine.duration(),
        }
    }

    // ---- commands ----

    /// Load and start `playlist[index]`.
    ///
    /// Engine failures end in `Failed(reason)` and are not returned; only an
    /// out-of-range index is an error.
    pub fn play_at(&mut self, index: usize) -> Result<(), SessionError> {
        let Some(track) = self.playlist.get(index).cloned() else {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.playlist.len(),
            });
        };

        self.timer.cancel();
        self.cursor = Some(index);
        self.unparented = false;
        self.generation = None;
        self.current = Some(track.clone());
        self.set_state(PlaybackState::Loading);

        let ready = match self.engine.open(&track.source, track.duration_ms) {
            Ok(ready) => ready,
            Err(e) => {
                warn!(track = %track.id, error = %e, "cannot open track");
                self.fail(e.to_string());
                return Ok(());
            }
        };
        self.generation = Some(ready.generation);

        if let Err(e) = self.engine.start() {
            warn!(track = %track.id, error = %e, "cannot start track");
            self.fail(e.to_string());
            return Ok(());
        }

        info!(track = %track.id, title = %track.title, duration_ms = ready.duration_ms, "playing");
        self.set_state(PlaybackState::Playing);
        self.timer.arm(Instant::now());
        Ok(())
    }

    pub fn play_next(&mut self) -> Result<(), SessionError> {
        match self.step_index(1) {
            Some(index) => self.play_at(index),
            None => Ok(()),
        }
    }

    pub fn play_previous(&mut self) -> Result<(), SessionError> {
        match self.step_index(-1) {
            Some(index) => self.play_at(index),
            None => Ok(()),
        }
    }

    /// `cursor ± 1` with wrap-around; first entry when there is no usable cursor.
    fn step_index(&self, delta: isize) -> Option<usize> {
        let len = self.playlist.len();
        if len == 0 {
            return None;
        }
        match self.cursor {
            Some(cursor) if !self.unparented && cursor < len => {
                Some((cursor as isize + delta).rem_euclid(len as isize) as usize)
            }
            _ => Some(0),
        }
    }

    pub fn pause(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        self.engine.pause();
        self.timer.cancel();
        self.set_state(PlaybackState::Paused);
    }

    /// Continue the loaded track. Rejected with `NoActiveSource` when nothing
    /// usable is loaded (after `stop`, or after a failure).
    pub fn resume(&mut self) -> Result<(), SessionError> {
        if self.state.is_playing() {
            return Ok(());
        }
        self.engine.resume()?;
        self.set_state(PlaybackState::Playing);
        self.timer.arm(Instant::now());
        Ok(())
    }

    pub fn toggle_play_pause(&mut self) -> Result<(), SessionError> {
        match self.state {
            PlaybackState::Playing => {
                self.pause();
                Ok(())
            }
            PlaybackState::Paused => self.resume(),
            PlaybackState::Loading => Ok(()),
            PlaybackState::Idle | PlaybackState::Failed(_) => {
                let len = self.playlist.len();
                if len == 0 {
                    return Ok(());
                }
                let index = match self.cursor {
                    Some(cursor) if !self.unparented && cursor < len => cursor,
                    _ => 0,
                };
                self.play_at(index)
            }
        }
    }

    /// Halt playback and release the engine handle. The cursor is kept.
    pub fn stop(&mut self) {
        self.timer.cancel();
        self.engine.stop();
        self.generation = None;
        self.current = None;
        self.set_state(PlaybackState::Idle);
    }

    /// Jump within the current track; the state does not change.
    pub fn seek(&mut self, position_ms: i64) {
        let Some(applied) = self.engine.seek(position_ms) else {
            debug!(position_ms, "seek ignored without a loaded track");
            return;
        };
        self.observers.broadcast(&SessionUpdate::Progress(Progress {
            position_ms: applied,
            duration_ms: self.engine.duration(),
        }));
    }

    /// Replace the playlist without touching playback.
    ///
    /// The cursor follows the current track (or the track it pointed at) by
    /// identity; when that track is gone it falls back to the first entry and
    /// becomes unparented.
    pub fn set_playlist(&mut self, tracks: Vec<Track>) {
        let anchor = self
            .current
            .clone()
            .or_else(|| self.cursor.and_then(|c| self.playlist.get(c).cloned()));
        self.playlist = tracks;

        match anchor.and_then(|t| self.playlist.iter().position(|p| p.same_identity(&t))) {
            Some(index) => {
                self.cursor = Some(index);
                self.unparented = false;
            }
            None => {
                self.cursor = if self.playlist.is_empty() { None } else { Some(0) };
                self.unparented = true;
            }
        }
        debug!(len = self.playlist.len(), cursor = ?self.cursor, unparented = self.unparented, "playlist replaced");

        self.observers
            .broadcast(&SessionUpdate::Changed(self.snapshot()));
    }

    /// Stop progress ticks while the user drags the seek bar.
    pub fn begin_seek_drag(&mut self) {
        self.timer.suspend();
    }

    pub fn end_seek_drag(&mut self, position_ms: i64, now: Instant) {
        self.seek(position_ms);
        self.timer.resume(now);
    }

    // ---- engine / timer ----

    /// Ask the engine for completion or failure; events come back through
    /// the engine's event sink.
    pub fn poll_engine(&mut self) {
        self.engine.poll();
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        let generation = match &event {
            EngineEvent::Completed { generation } | EngineEvent::Failed { generation, .. } => *generation,
        };
        if self.generation != Some(generation) {
            debug!(generation, current = ?self.generation, "ignoring event from a released handle");
            return;
        }

        match event {
            EngineEvent::Completed { .. } => {
                if !self.state.is_playing() {
                    return;
                }
                if self.playlist.is_empty() {
                    info!("track finished with an empty playlist; stopping");
                    self.stop();
                } else if let Err(e) = self.play_next() {
                    warn!(error = %e, "cannot advance after completion");
                }
            }
            EngineEvent::Failed { reason, .. } => {
                warn!(%reason, "playback failed");
                self.fail(reason);
            }
        }
    }

    /// Publish a progress update if the timer is due.
    pub fn tick(&mut self, now: Instant) {
        if !self.state.is_playing() || !self.timer.fire(now) {
            return;
        }
        self.observers.broadcast(&SessionUpdate::Progress(Progress {
            position_ms: self.engine.position(),
            duration_ms: self.engine.duration(),
        }));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.next_deadline()
    }

    // ---- observers ----

    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) -> SubscriptionId {
        let initial = SessionUpdate::Changed(self.snapshot());
        self.observers.add(observer, &initial)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Release the engine and take the surface down. Errors are logged.
    pub fn shutdown(&mut self) {
        self.stop();
        if self.surface_live {
            self.cancel_surface();
        }
        info!("playback session shut down");
    }

    // ---- internals ----

    fn fail(&mut self, reason: String) {
        self.timer.cancel();
        self.set_state(PlaybackState::Failed(reason));
    }

    fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
        self.publish();
    }

    /// One push per distinct `(track, state)`.
    fn publish(&mut self) {
        let key = (self.current.as_ref().map(|t| t.id), self.state.clone());
        if self.last_published.as_ref() == Some(&key) {
            return;
        }
        debug!(track = ?key.0, state = %key.1, "session changed");
        self.last_published = Some(key);

        let snapshot = self.snapshot();
        if snapshot.state == PlaybackState::Idle {
            if self.surface_live {
                self.cancel_surface();
            }
        } else {
            match self.surface.present(&Presentation::from_snapshot(&snapshot)) {
                Ok(()) => self.surface_live = true,
                Err(e) => warn!(error = %e, "cannot update the session surface"),
            }
        }
        self.observers.broadcast(&SessionUpdate::Changed(snapshot));
    }

    fn cancel_surface(&mut self) {
        self.surface_live = false;
        if let Err(e) = self.surface.cancel() {
            warn!(error = %e, "cannot cancel the session surface");
        }
    }
}
