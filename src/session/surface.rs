use thiserror::Error;

use crate::audio::Millis;
use crate::library::TrackId;

use super::command::Command;
use super::snapshot::{PlaybackState, Snapshot};

pub const FALLBACK_TITLE: &str = "carmusic";
pub const FALLBACK_ARTIST: &str = "Not playing";

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[error("surface is no longer running")]
    Closed,

    #[error("surface did not confirm within {0:?}")]
    Unresponsive(std::time::Duration),
}

/// Buttons offered by the surface, in display order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceAction {
    Previous,
    TogglePlayPause,
    Next,
}

/// Commands the surface may send back into the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceCommand {
    Previous,
    Next,
    TogglePlayPause,
    Stop,
}

impl From<SurfaceCommand> for Command {
    fn from(cmd: SurfaceCommand) -> Self {
        match cmd {
            SurfaceCommand::Previous => Command::PlayPrevious,
            SurfaceCommand::Next => Command::PlayNext,
            SurfaceCommand::TogglePlayPause => Command::TogglePlayPause,
            SurfaceCommand::Stop => Command::Stop,
        }
    }
}

/// Everything the surface shows, rebuilt in full on every push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub track_id: Option<TrackId>,
    pub title: String,
    pub artist: String,
    pub play_pause_label: &'static str,
    pub actions: Vec<SurfaceAction>,
    /// Only while actually playing.
    pub ongoing: bool,
    pub length_ms: Millis,
    /// MPRIS `PlaybackStatus`.
    pub status: &'static str,
}

impl Presentation {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let track = snapshot.track.as_ref();
        let playing = snapshot.state.is_playing();
        Self {
            track_id: track.map(|t| t.id),
            title: track
                .map(|t| t.title.clone())
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            artist: track
                .map(|t| t.artist.clone())
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_ARTIST.to_string()),
            play_pause_label: if playing { "Pause" } else { "Play" },
            actions: vec![
                SurfaceAction::Previous,
                SurfaceAction::TogglePlayPause,
                SurfaceAction::Next,
            ],
            ongoing: playing,
            length_ms: match track {
                Some(_) if snapshot.duration_ms > 0 => snapshot.duration_ms,
                Some(t) => t.duration_ms,
                None => 0,
            },
            status: match snapshot.state {
                PlaybackState::Playing | PlaybackState::Loading => "Playing",
                PlaybackState::Paused => "Paused",
                PlaybackState::Idle | PlaybackState::Failed(_) => "Stopped",
            },
        }
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::from_snapshot(&Snapshot::default())
    }
}

/// OS-level presentation of the session (MPRIS here).
///
/// `present` creates the surface if needed and replaces its content;
/// `cancel` removes it entirely.
pub trait SessionSurface: Send {
    fn present(&mut self, presentation: &Presentation) -> Result<(), SurfaceError>;
    fn cancel(&mut self) -> Result<(), SurfaceError>;
}

/// Surface used when MPRIS is disabled.
#[derive(Debug, Default)]
pub struct NullSurface;

impl SessionSurface for NullSurface {
    fn present(&mut self, _presentation: &Presentation) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}
