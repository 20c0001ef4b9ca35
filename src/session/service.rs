use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::audio::{AudioEngine, AudioOutput, EngineError, EngineEvent, ResourceResolver};
use crate::config::AudioSettings;
use crate::library::Track;

use super::command::Command;
use super::error::SessionError;
use super::machine::PlaybackSession;
use super::observer::{SessionObserver, SubscriptionId};
use super::snapshot::Snapshot;
use super::surface::SessionSurface;

type Reply<T> = Sender<T>;

pub(crate) enum SessionMsg {
    Command {
        command: Command,
        reply: Option<Reply<Result<(), SessionError>>>,
    },
    Engine(EngineEvent),
    Subscribe {
        observer: Box<dyn SessionObserver>,
        reply: Reply<SubscriptionId>,
    },
    Unsubscribe(SubscriptionId),
    Snapshot(Reply<Snapshot>),
    Shutdown(Option<Reply<()>>),
}

#[cfg(test)]
impl SessionMsg {
    pub(crate) fn into_command(self) -> Option<Command> {
        match self {
            SessionMsg::Command { command, .. } => Some(command),
            _ => None,
        }
    }
}

/// Cheap, cloneable entry point into a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: Sender<SessionMsg>,
}

impl SessionHandle {
    /// Queue `command` without waiting for it to run.
    pub fn submit(&self, command: Command) -> Result<(), SessionError> {
        self.tx
            .send(SessionMsg::Command {
                command,
                reply: None,
            })
            .map_err(|_| SessionError::Disconnected)
    }

    /// Run `command` and wait for its outcome.
    pub fn execute(&self, command: Command) -> Result<(), SessionError> {
        let (reply, rx) = mpsc::channel();
        self.tx
            .send(SessionMsg::Command {
                command,
                reply: Some(reply),
            })
            .map_err(|_| SessionError::Disconnected)?;
        rx.recv().map_err(|_| SessionError::Disconnected)?
    }

    pub fn play_at(&self, index: usize) -> Result<(), SessionError> {
        self.execute(Command::PlayAt(index))
    }

    pub fn play_next(&self) -> Result<(), SessionError> {
        self.execute(Command::PlayNext)
    }

    pub fn play_previous(&self) -> Result<(), SessionError> {
        self.execute(Command::PlayPrevious)
    }

    pub fn pause(&self) -> Result<(), SessionError> {
        self.execute(Command::Pause)
    }

    pub fn resume(&self) -> Result<(), SessionError> {
        self.execute(Command::Resume)
    }

    pub fn toggle_play_pause(&self) -> Result<(), SessionError> {
        self.execute(Command::TogglePlayPause)
    }

    pub fn stop(&self) -> Result<(), SessionError> {
        self.execute(Command::Stop)
    }

    pub fn seek(&self, position_ms: i64) -> Result<(), SessionError> {
        self.execute(Command::Seek(position_ms))
    }

    pub fn set_playlist(&self, tracks: Vec<Track>) -> Result<(), SessionError> {
        self.execute(Command::SetPlaylist(tracks))
    }

    pub fn begin_seek_drag(&self) -> Result<(), SessionError> {
        self.execute(Command::BeginSeekDrag)
    }

    pub fn end_seek_drag(&self, position_ms: i64) -> Result<(), SessionError> {
        self.execute(Command::EndSeekDrag(position_ms))
    }

    pub fn snapshot(&self) -> Result<Snapshot, SessionError> {
        let (reply, rx) = mpsc::channel();
        self.tx
            .send(SessionMsg::Snapshot(reply))
            .map_err(|_| SessionError::Disconnected)?;
        rx.recv().map_err(|_| SessionError::Disconnected)
    }

    /// Register an observer; it immediately receives the current snapshot.
    pub fn subscribe(&self, observer: impl SessionObserver + 'static) -> Result<SubscriptionId, SessionError> {
        let (reply, rx) = mpsc::channel();
        self.tx
            .send(SessionMsg::Subscribe {
                observer: Box::new(observer),
                reply,
            })
            .map_err(|_| SessionError::Disconnected)?;
        rx.recv().map_err(|_| SessionError::Disconnected)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<(), SessionError> {
        self.tx
            .send(SessionMsg::Unsubscribe(id))
            .map_err(|_| SessionError::Disconnected)
    }

    /// A handle whose messages land in the returned receiver.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, Receiver<SessionMsg>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

/// Owns the session worker thread.
pub struct SessionService {
    tx: Sender<SessionMsg>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SessionService {
    /// Start the worker.
    ///
    /// `make_output` runs on the worker thread (audio streams are not always
    /// `Send`); its error is returned here. `make_surface` receives a handle
    /// so the surface can route its commands back in.
    pub fn spawn<O, F, S>(settings: &AudioSettings, make_output: F, make_surface: S) -> Result<Self, SessionError>
    where
        O: AudioOutput + 'static,
        F: FnOnce() -> Result<O, EngineError> + Send + 'static,
        S: FnOnce(SessionHandle) -> Box<dyn SessionSurface>,
    {
        let (tx, rx) = mpsc::channel::<SessionMsg>();
        let surface = make_surface(SessionHandle { tx: tx.clone() });

        let poll_interval = Duration::from_millis(settings.poll_interval_ms);
        let check_interval = Duration::from_millis(settings.completion_check_ms.max(1));
        let resources = ResourceResolver::new(settings.resource_dir.clone(), settings.extensions.clone());
        let event_tx = tx.clone();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), EngineError>>();

        let worker = thread::Builder::new()
            .name("playback-session".into())
            .spawn(move || {
                let output = match make_output() {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let engine = AudioEngine::new(
                    output,
                    resources,
                    Box::new(move |event| {
                        let _ = event_tx.send(SessionMsg::Engine(event));
                    }),
                );
                let session = PlaybackSession::new(engine, surface, poll_interval);
                let _ = ready_tx.send(Ok(()));
                run_worker(session, rx, check_interval);
            })
            .map_err(|e| {
                error!(error = %e, "cannot spawn the session worker");
                SessionError::Disconnected
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("playback session started");
                Ok(Self {
                    tx,
                    worker: Mutex::new(Some(worker)),
                })
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(SessionError::Engine(e))
            }
            Err(_) => {
                let _ = worker.join();
                Err(SessionError::Disconnected)
            }
        }
    }

    /// A handle to the running session, or `Disconnected` once it has ended.
    pub fn connect(&self) -> Result<SessionHandle, SessionError> {
        let worker = self.worker.lock().map_err(|_| SessionError::Disconnected)?;
        match worker.as_ref() {
            Some(handle) if !handle.is_finished() => Ok(SessionHandle {
                tx: self.tx.clone(),
            }),
            _ => Err(SessionError::Disconnected),
        }
    }

    /// Stop playback, cancel the surface and join the worker. Idempotent.
    pub fn shutdown(&self) {
        let Ok(mut worker) = self.worker.lock() else {
            return;
        };
        let Some(handle) = worker.take() else {
            return;
        };

        let (done_tx, done_rx) = mpsc::channel();
        if self.tx.send(SessionMsg::Shutdown(Some(done_tx))).is_ok() {
            let _ = done_rx.recv();
        }
        if handle.join().is_err() {
            warn!("session worker panicked");
        }
    }
}

impl Drop for SessionService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker<O: AudioOutput>(mut session: PlaybackSession<O>, rx: Receiver<SessionMsg>, check_interval: Duration) {
    loop {
        let now = Instant::now();
        let wait = session
            .next_deadline()
            .map_or(check_interval, |due| due.saturating_duration_since(now).min(check_interval));

        match rx.recv_timeout(wait) {
            Ok(SessionMsg::Shutdown(done)) => {
                session.shutdown();
                if let Some(done) = done {
                    let _ = done.send(());
                }
                return;
            }
            Ok(msg) => dispatch(&mut session, msg),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                session.shutdown();
                return;
            }
        }

        session.poll_engine();
        session.tick(Instant::now());
    }
}

fn dispatch<O: AudioOutput>(session: &mut PlaybackSession<O>, msg: SessionMsg) {
    match msg {
        SessionMsg::Command { command, reply } => {
            let name = command.name();
            let result = session.apply(command);
            if let Err(e) = &result {
                debug!(command = name, error = %e, "session command rejected");
            }
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        }
        SessionMsg::Engine(event) => session.handle_engine_event(event),
        SessionMsg::Subscribe { observer, reply } => {
            let id = session.subscribe(observer);
            let _ = reply.send(id);
        }
        SessionMsg::Unsubscribe(id) => {
            session.unsubscribe(id);
        }
        SessionMsg::Snapshot(reply) => {
            let _ = reply.send(session.snapshot());
        }
        // Handled by the loop.
        SessionMsg::Shutdown(_) => {}
    }
}
