use tracing::info;

use crate::audio::RodioOutput;
use crate::config;
use crate::mpris::MprisSurface;
use crate::session::{NullSurface, SessionError, SessionService, SessionSurface};

/// Start the playback session on the default audio device, with the MPRIS
/// surface when it is enabled.
pub fn start_session(settings: &config::Settings) -> Result<SessionService, SessionError> {
    let surface = settings.surface.clone();
    SessionService::spawn(&settings.audio, RodioOutput::open_default, move |handle| {
        if surface.enabled {
            info!(identity = %surface.identity, "media surface enabled");
            Box::new(MprisSurface::spawn(&surface.identity, handle)) as Box<dyn SessionSurface>
        } else {
            Box::new(NullSurface)
        }
    })
}
