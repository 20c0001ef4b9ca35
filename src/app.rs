//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and mirrors the playback session for
//! drawing, plus the local selection and seek-drag state.

mod model;

pub use model::*;
