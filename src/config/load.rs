use std::collections::HashSet;
use std::{env, path::PathBuf};

use crate::library::FIRST_IMPORTED_ID;

use super::schema::{LibrarySettings, Settings};

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `CARMUSIC__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("CARMUSIC")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.audio.poll_interval_ms == 0 {
            return Err("audio.poll_interval_ms must be >= 1".to_string());
        }
        if self.audio.completion_check_ms == 0 {
            return Err("audio.completion_check_ms must be >= 1".to_string());
        }

        let mut seen = HashSet::new();
        for track in &self.library.builtin {
            if track.id >= FIRST_IMPORTED_ID {
                return Err(format!(
                    "library.builtin id {} is reserved for imported tracks (must be < {})",
                    track.id, FIRST_IMPORTED_ID
                ));
            }
            if !seen.insert(track.id) {
                return Err(format!("library.builtin id {} is used twice", track.id));
            }
        }
        Ok(())
    }
}

impl LibrarySettings {
    /// The configured data directory, or the XDG default.
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(default_data_dir)
    }
}

/// Resolve the config path from `CARMUSIC_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("CARMUSIC_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/carmusic/config.toml`
/// or `~/.config/carmusic/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("carmusic").join("config.toml"))
}

/// `$XDG_DATA_HOME/carmusic`, or `~/.local/share/carmusic`.
fn default_data_dir() -> Option<PathBuf> {
    xdg_dir("XDG_DATA_HOME", ".local/share").map(|d| d.join("carmusic"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
