use crate::library::Track;

/// Everything that can be asked of the session, whatever its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PlayAt(usize),
    PlayNext,
    PlayPrevious,
    Pause,
    Resume,
    TogglePlayPause,
    Stop,
    /// Absolute position in milliseconds; clamped by the engine.
    Seek(i64),
    SetPlaylist(Vec<Track>),
    BeginSeekDrag,
    EndSeekDrag(i64),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::PlayAt(_) => "play_at",
            Command::PlayNext => "play_next",
            Command::PlayPrevious => "play_previous",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::TogglePlayPause => "toggle_play_pause",
            Command::Stop => "stop",
            Command::Seek(_) => "seek",
            Command::SetPlaylist(_) => "set_playlist",
            Command::BeginSeekDrag => "begin_seek_drag",
            Command::EndSeekDrag(_) => "end_seek_drag",
        }
    }
}
