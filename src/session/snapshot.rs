use std::fmt;

use crate::audio::Millis;
use crate::library::{Track, TrackId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    /// The engine could not open or keep playing the current track.
    Failed(String),
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            PlaybackState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => f.write_str("idle"),
            PlaybackState::Loading => f.write_str("loading"),
            PlaybackState::Playing => f.write_str("playing"),
            PlaybackState::Paused => f.write_str("paused"),
            PlaybackState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Full view of the session, pushed whenever track or state changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub track: Option<Track>,
    pub cursor: Option<usize>,
    pub state: PlaybackState,
    pub position_ms: Millis,
    pub duration_ms: Millis,
}

impl Snapshot {
    pub fn track_id(&self) -> Option<TrackId> {
        self.track.as_ref().map(|t| t.id)
    }

    pub fn title(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.title.as_str())
    }

    pub fn artist(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.artist.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Progress {
    pub position_ms: Millis,
    pub duration_ms: Millis,
}

/// What observers receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Changed(Snapshot),
    Progress(Progress),
}
