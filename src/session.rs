//! Playback session: the single owner of playlist, cursor, playback state and
//! the engine handle.
//!
//! [`PlaybackSession`] is the state machine. [`SessionService`] runs it on a
//! dedicated worker thread and hands out [`SessionHandle`]s; every caller (UI,
//! the MPRIS surface, engine events) goes through the same message queue.

mod command;
mod error;
mod machine;
mod observer;
mod service;
mod snapshot;
mod surface;
mod timer;

pub use command::Command;
pub use error::SessionError;
pub use machine::PlaybackSession;
pub use observer::{SessionObserver, SubscriptionId};
pub use service::{SessionHandle, SessionService};
pub use snapshot::{PlaybackState, Progress, SessionUpdate, Snapshot};
pub use surface::{
    NullSurface, Presentation, SessionSurface, SurfaceAction, SurfaceCommand, SurfaceError,
};
pub use timer::ProgressTimer;

#[cfg(test)]
pub(crate) use service::SessionMsg;
