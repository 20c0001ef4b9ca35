use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

const LOG_FILE: &str = "carmusic.log";

/// `RUST_LOG` wins over the configured filter; a bad directive falls back to `info`.
fn build_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Send `tracing` output to `<data_dir>/carmusic.log`; the terminal belongs to the UI.
///
/// Failures are reported on stderr and never stop the player from starting.
pub fn init_logging(data_dir: &Path, settings: &LoggingSettings) -> Option<PathBuf> {
    let path = data_dir.join(LOG_FILE);
    let file = fs::create_dir_all(data_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    });
    let file = match file {
        Ok(f) => f,
        Err(e) => {
            eprintln!("carmusic: cannot open log file {}: {e}", path.display());
            return None;
        }
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(Mutex::new(file));

    let result = tracing_subscriber::registry()
        .with(build_filter(settings))
        .with(fmt_layer)
        .try_init();
    if let Err(e) = result {
        eprintln!("carmusic: failed to initialize logging: {e}");
        return None;
    }
    Some(path)
}
