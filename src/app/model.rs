//! Application model: what the TUI shows.
//!
//! The model never drives playback itself. It mirrors the session through
//! [`SessionUpdate`]s and keeps the local bits the session does not care
//! about (selection, an in-progress seek drag, a status line message).

use std::time::{Duration, Instant};

use crate::audio::Millis;
use crate::library::Track;
use crate::session::{PlaybackState, SessionUpdate, Snapshot};

/// A seek being dragged with `H`/`L`, committed once input goes idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeekDrag {
    target_ms: Millis,
    last_input: Instant,
}

/// The main application model.
#[derive(Debug, Default)]
pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,
    pub snapshot: Snapshot,
    pub position_ms: Millis,
    pub duration_ms: Millis,
    pub status_message: Option<String>,
    drag: Option<SeekDrag>,
}

impl App {
    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            ..Self::default()
        }
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Replace the list, keeping the selection in range.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.selected = self.selected.min(self.tracks.len().saturating_sub(1));
    }

    /// Move selection down (wraps).
    pub fn next(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.tracks.len();
    }

    /// Move selection up (wraps).
    pub fn prev(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.selected = if self.selected == 0 {
            self.tracks.len() - 1
        } else {
            self.selected - 1
        };
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    /// Index of the track the session has loaded, if it is in our list.
    pub fn playing_index(&self) -> Option<usize> {
        let track = self.snapshot.track.as_ref()?;
        self.snapshot
            .cursor
            .filter(|&i| self.tracks.get(i).is_some_and(|t| t.same_identity(track)))
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Fold a session update into the model. The selection jumps to a newly
    /// loaded track; progress is ignored while a drag is in flight.
    pub fn apply_update(&mut self, update: &SessionUpdate) {
        match update {
            SessionUpdate::Changed(snapshot) => {
                let track_changed = snapshot.track_id() != self.snapshot.track_id();
                self.snapshot = snapshot.clone();
                if track_changed && let Some(i) = self.playing_index() {
                    self.selected = i;
                }
                if self.drag.is_none() {
                    self.position_ms = snapshot.position_ms;
                }
                self.duration_ms = match &snapshot.track {
                    Some(_) if snapshot.duration_ms > 0 => snapshot.duration_ms,
                    Some(t) => t.duration_ms,
                    None => 0,
                };
                if matches!(snapshot.state, PlaybackState::Idle) {
                    self.position_ms = 0;
                }
            }
            SessionUpdate::Progress(p) => {
                if self.drag.is_none() {
                    self.position_ms = p.position_ms;
                    if p.duration_ms > 0 {
                        self.duration_ms = p.duration_ms;
                    }
                }
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Move the drag target by `delta_ms`, starting a drag if none is active.
    ///
    /// Returns `true` when this call started the drag. Does nothing while no
    /// track is loaded.
    pub fn scrub(&mut self, delta_ms: i64, now: Instant) -> bool {
        if self.snapshot.track.is_none() {
            return false;
        }
        let started = self.drag.is_none();
        let from = self.drag.map_or(self.position_ms, |d| d.target_ms);
        let target = (from as i64)
            .saturating_add(delta_ms)
            .clamp(0, self.duration_ms.min(i64::MAX as u64) as i64) as Millis;
        self.drag = Some(SeekDrag {
            target_ms: target,
            last_input: now,
        });
        started
    }

    /// End the drag once no scrub input arrived for `idle`; returns the
    /// position to seek to.
    pub fn take_idle_drag(&mut self, now: Instant, idle: Duration) -> Option<Millis> {
        let drag = self.drag?;
        if now.saturating_duration_since(drag.last_input) < idle {
            return None;
        }
        self.drag = None;
        self.position_ms = drag.target_ms;
        Some(drag.target_ms)
    }

    /// Position to draw: the drag preview while dragging.
    pub fn displayed_position(&self) -> Millis {
        self.drag.map_or(self.position_ms, |d| d.target_ms)
    }

    pub fn progress_ratio(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.displayed_position() as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
    }
}
