use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/carmusic/config.toml` or `~/.config/carmusic/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CARMUSIC__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub library: LibrarySettings,
    pub surface: SurfaceSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// How often a progress update is published while playing (milliseconds).
    pub poll_interval_ms: u64,
    /// How often the engine is checked for completion or failure (milliseconds).
    pub completion_check_ms: u64,
    /// Directory holding the audio for built-in tracks.
    pub resource_dir: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            completion_check_ms: 200,
            resource_dir: None,
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
        }
    }
}

/// A track shipped with the player.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuiltinTrack {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub duration_ms: u64,
    /// Resource name, resolved against `audio.resource_dir`.
    pub resource: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Where imported files and their records live.
    /// Defaults to `$XDG_DATA_HOME/carmusic` or `~/.local/share/carmusic`.
    pub data_dir: Option<PathBuf>,
    /// Built-in tracks, listed before any imported file.
    pub builtin: Vec<BuiltinTrack>,
    /// Whether to follow symlinks when importing a directory.
    pub follow_links: bool,
    /// Whether directory import descends into subdirectories.
    pub recursive: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            builtin: Vec::new(),
            follow_links: true,
            recursive: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SurfaceSettings {
    /// Whether to publish the MPRIS player object.
    pub enabled: bool,
    /// Suffix of the bus name and the player identity.
    pub identity: String,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            identity: "carmusic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Number of seconds to move when pressing `H` / `L`.
    pub seek_step_seconds: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ carmusic ~ ".to_string(),
            seek_step_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
