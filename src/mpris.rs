//! MPRIS session surface.
//!
//! The player object lives on its own thread with its own executor. It is
//! registered on the session bus on the first `present`, updated on every
//! later one, and removed (bus name released) on `cancel`. `cancel` and
//! dropping the surface both wait for the removal to finish.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::session::{
    Command, Presentation, SessionHandle, SessionSurface, SurfaceCommand, SurfaceError,
};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";
/// Upper bound on waiting for the bus objects to be removed.
const CANCEL_TIMEOUT: Duration = Duration::from_secs(2);

enum SurfaceMsg {
    Present(Presentation),
    /// Remove the player; the sender is told once it is gone.
    Cancel(Sender<()>),
}

type SharedPresentation = Arc<Mutex<Presentation>>;

fn route(session: &SessionHandle, cmd: SurfaceCommand) {
    if let Err(e) = session.submit(Command::from(cmd)) {
        warn!(?cmd, error = %e, "MPRIS command dropped");
    }
}

struct RootIface {
    identity: String,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        // Quitting is left to the UI.
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> String {
        self.identity.clone()
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    session: SessionHandle,
    state: SharedPresentation,
}

impl PlayerIface {
    fn is_playing(&self) -> bool {
        self.state.lock().is_ok_and(|p| p.ongoing)
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        route(&self.session, SurfaceCommand::Next);
    }

    fn previous(&self) {
        route(&self.session, SurfaceCommand::Previous);
    }

    fn play(&self) {
        if !self.is_playing() {
            route(&self.session, SurfaceCommand::TogglePlayPause);
        }
    }

    fn pause(&self) {
        if self.is_playing() {
            route(&self.session, SurfaceCommand::TogglePlayPause);
        }
    }

    fn play_pause(&self) {
        route(&self.session, SurfaceCommand::TogglePlayPause);
    }

    fn stop(&self) {
        route(&self.session, SurfaceCommand::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.state.lock().map(|p| p.status).unwrap_or("Stopped")
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        match self.state.lock() {
            Ok(p) => metadata_for(&p),
            Err(_) => HashMap::new(),
        }
    }
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

/// MPRIS metadata map for a presentation.
fn metadata_for(p: &Presentation) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();

    let track_path = p
        .track_id
        .and_then(|id| ObjectPath::try_from(format!("{OBJECT_PATH}/track/{id}")).ok())
        .or_else(|| ObjectPath::try_from(NO_TRACK).ok());
    if let Some(v) = track_path.and_then(|path| owned(Value::from(path))) {
        map.insert("mpris:trackid".to_string(), v);
    }
    if let Some(v) = owned(Value::from(p.title.clone())) {
        map.insert("xesam:title".to_string(), v);
    }
    if let Some(v) = owned(Value::from(vec![p.artist.clone()])) {
        map.insert("xesam:artist".to_string(), v);
    }
    let length_us = i64::try_from(p.length_ms.saturating_mul(1000)).unwrap_or(i64::MAX);
    if let Some(v) = owned(Value::from(length_us)) {
        map.insert("mpris:length".to_string(), v);
    }
    map
}

/// A live registration on the bus.
struct Registration {
    connection: Connection,
    bus_name: String,
}

async fn register(
    identity: &str,
    session: &SessionHandle,
    state: &SharedPresentation,
) -> zbus::Result<Registration> {
    let connection = Connection::session().await?;
    let bus_name = format!("org.mpris.MediaPlayer2.{identity}");
    connection.request_name(bus_name.as_str()).await?;

    let object_server = connection.object_server();
    object_server
        .at(
            OBJECT_PATH,
            RootIface {
                identity: identity.to_string(),
            },
        )
        .await?;
    object_server
        .at(
            OBJECT_PATH,
            PlayerIface {
                session: session.clone(),
                state: state.clone(),
            },
        )
        .await?;

    info!(%bus_name, "MPRIS player registered");
    Ok(Registration {
        connection,
        bus_name,
    })
}

async fn announce(reg: &Registration) -> zbus::Result<()> {
    let iface_ref = reg
        .connection
        .object_server()
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    let emitter = iface_ref.signal_emitter();
    let iface = iface_ref.get().await;
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    Ok(())
}

async fn teardown(reg: Registration) {
    let object_server = reg.connection.object_server();
    if let Err(e) = object_server.remove::<PlayerIface, _>(OBJECT_PATH).await {
        warn!(error = %e, "cannot remove MPRIS player interface");
    }
    if let Err(e) = object_server.remove::<RootIface, _>(OBJECT_PATH).await {
        warn!(error = %e, "cannot remove MPRIS root interface");
    }
    if let Err(e) = reg.connection.release_name(reg.bus_name.as_str()).await {
        warn!(error = %e, "cannot release MPRIS bus name");
    }
    info!(bus_name = %reg.bus_name, "MPRIS player removed");
}

async fn serve(identity: String, session: SessionHandle, rx: Receiver<SurfaceMsg>) {
    let state: SharedPresentation = Arc::new(Mutex::new(Presentation::default()));
    let mut live: Option<Registration> = None;

    loop {
        match rx.try_recv() {
            Ok(SurfaceMsg::Present(p)) => {
                if let Ok(mut s) = state.lock() {
                    *s = p;
                }
                match &live {
                    Some(reg) => {
                        if let Err(e) = announce(reg).await {
                            debug!(error = %e, "cannot announce MPRIS property change");
                        }
                    }
                    None => match register(&identity, &session, &state).await {
                        Ok(reg) => live = Some(reg),
                        Err(e) => warn!(error = %e, "cannot register MPRIS player"),
                    },
                }
            }
            Ok(SurfaceMsg::Cancel(done)) => {
                if let Some(reg) = live.take() {
                    teardown(reg).await;
                }
                let _ = done.send(());
            }
            Err(TryRecvError::Empty) => {
                Timer::after(Duration::from_millis(50)).await;
            }
            Err(TryRecvError::Disconnected) => {
                if let Some(reg) = live.take() {
                    teardown(reg).await;
                }
                return;
            }
        }
    }
}

/// [`SessionSurface`] backed by an MPRIS player object.
///
/// Dropping it closes the channel, which makes the thread tear the player
/// down and exit; the drop joins the thread.
pub struct MprisSurface {
    tx: Option<Sender<SurfaceMsg>>,
    thread: Option<JoinHandle<()>>,
}

impl MprisSurface {
    /// Start the MPRIS thread. Commands from the bus are sent to `session`.
    pub fn spawn(identity: &str, session: SessionHandle) -> Self {
        let (tx, rx) = mpsc::channel();
        let identity = identity.to_string();
        let spawned = std::thread::Builder::new()
            .name("mpris".into())
            .spawn(move || block_on(serve(identity, session, rx)));
        let thread = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "cannot start MPRIS thread; surface disabled");
                None
            }
        };
        Self { tx: Some(tx), thread }
    }

    fn send(&self, msg: SurfaceMsg) -> Result<(), SurfaceError> {
        self.tx
            .as_ref()
            .ok_or(SurfaceError::Closed)?
            .send(msg)
            .map_err(|_| SurfaceError::Closed)
    }
}

impl SessionSurface for MprisSurface {
    fn present(&mut self, presentation: &Presentation) -> Result<(), SurfaceError> {
        self.send(SurfaceMsg::Present(presentation.clone()))
    }

    /// Returns once the player is off the bus.
    fn cancel(&mut self) -> Result<(), SurfaceError> {
        let (done_tx, done_rx) = mpsc::channel();
        self.send(SurfaceMsg::Cancel(done_tx))?;
        match done_rx.recv_timeout(CANCEL_TIMEOUT) {
            Ok(()) => Ok(()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(SurfaceError::Unresponsive(CANCEL_TIMEOUT)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(SurfaceError::Closed),
        }
    }
}

impl Drop for MprisSurface {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("MPRIS thread panicked");
        }
    }
}
