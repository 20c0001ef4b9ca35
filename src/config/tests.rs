use super::load::{default_config_path, resolve_config_path};
use std::path::PathBuf;
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_carmusic_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("CARMUSIC_CONFIG_PATH", "/tmp/carmusic-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        PathBuf::from("/tmp/carmusic-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/xdg-config-home/carmusic/config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/home-dir/.config/carmusic/config.toml")
    );
}

#[test]
fn data_dir_uses_explicit_setting_then_xdg_data_home_then_home() {
    let _lock = env_lock();
    let explicit = LibrarySettings {
        data_dir: Some(PathBuf::from("/srv/music-data")),
        ..LibrarySettings::default()
    };
    assert_eq!(explicit.resolve_data_dir().unwrap(), PathBuf::from("/srv/music-data"));

    let _g1 = EnvGuard::set("XDG_DATA_HOME", "/tmp/xdg-data");
    assert_eq!(
        LibrarySettings::default().resolve_data_dir().unwrap(),
        PathBuf::from("/tmp/xdg-data/carmusic")
    );

    let _g2 = EnvGuard::remove("XDG_DATA_HOME");
    let _g3 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        LibrarySettings::default().resolve_data_dir().unwrap(),
        PathBuf::from("/tmp/home-dir/.local/share/carmusic")
    );
}

#[test]
fn defaults_are_valid() {
    let s = Settings::default();
    assert_eq!(s.audio.poll_interval_ms, 1000);
    assert_eq!(s.audio.completion_check_ms, 200);
    assert_eq!(s.ui.seek_step_seconds, 5);
    assert!(s.surface.enabled);
    assert_eq!(s.surface.identity, "carmusic");
    assert_eq!(s.logging.filter, "info");
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
poll_interval_ms = 500
completion_check_ms = 50
resource_dir = "/opt/carmusic/raw"
extensions = ["ogg"]

[library]
data_dir = "/tmp/carmusic-data"
recursive = false

[[library.builtin]]
id = 1
title = "Morning Drive"
artist = "Studio Band"
duration_ms = 185000
resource = "morning_drive"

[[library.builtin]]
id = 2
title = "Night Highway"
resource = "night_highway"

[surface]
enabled = false
identity = "dash"

[ui]
header_text = "hello"
seek_step_seconds = 9

[logging]
filter = "carmusic=debug"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CARMUSIC_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("CARMUSIC__AUDIO__POLL_INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.poll_interval_ms, 500);
    assert_eq!(s.audio.completion_check_ms, 50);
    assert_eq!(s.audio.resource_dir, Some(PathBuf::from("/opt/carmusic/raw")));
    assert_eq!(s.audio.extensions, vec!["ogg".to_string()]);
    assert_eq!(s.library.data_dir, Some(PathBuf::from("/tmp/carmusic-data")));
    assert!(!s.library.recursive);
    assert!(s.library.follow_links);
    assert_eq!(s.library.builtin.len(), 2);
    assert_eq!(
        s.library.builtin[0],
        BuiltinTrack {
            id: 1,
            title: "Morning Drive".into(),
            artist: "Studio Band".into(),
            duration_ms: 185_000,
            resource: "morning_drive".into(),
        }
    );
    assert_eq!(s.library.builtin[1].artist, "");
    assert_eq!(s.library.builtin[1].duration_ms, 0);
    assert!(!s.surface.enabled);
    assert_eq!(s.surface.identity, "dash");
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.seek_step_seconds, 9);
    assert_eq!(s.logging.filter, "carmusic=debug");
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
poll_interval_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CARMUSIC_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("CARMUSIC__AUDIO__POLL_INTERVAL_MS", "750");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.poll_interval_ms, 750);
}

#[test]
fn validate_rejects_zero_intervals() {
    let mut s = Settings::default();
    s.audio.poll_interval_ms = 0;
    assert!(s.validate().unwrap_err().contains("poll_interval_ms"));

    let mut s = Settings::default();
    s.audio.completion_check_ms = 0;
    assert!(s.validate().unwrap_err().contains("completion_check_ms"));
}

fn builtin(id: u32) -> BuiltinTrack {
    BuiltinTrack {
        id,
        title: format!("Track {id}"),
        artist: String::new(),
        duration_ms: 0,
        resource: format!("track_{id}"),
    }
}

#[test]
fn validate_rejects_duplicate_and_reserved_builtin_ids() {
    let mut s = Settings::default();
    s.library.builtin = vec![builtin(1), builtin(2), builtin(1)];
    assert!(s.validate().unwrap_err().contains("used twice"));

    s.library.builtin = vec![builtin(1), builtin(100)];
    assert!(s.validate().unwrap_err().contains("reserved"));
}
