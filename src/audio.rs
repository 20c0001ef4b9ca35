//! Audio engine adapter.
//!
//! Wraps a single decoding/playback handle behind [`AudioEngine`]. The engine
//! is generic over an [`AudioOutput`] backend so the session logic can be
//! driven by `rodio` in production and by an in-memory fake in tests.

mod engine;
mod error;
mod output;
mod resource;
mod sink;
mod types;

pub use engine::AudioEngine;
pub use error::EngineError;
pub use output::{AudioOutput, OpenedSink, SinkStatus, TrackSink};
pub use resource::ResourceResolver;
pub use sink::RodioOutput;
pub use types::*;

#[cfg(test)]
pub(crate) mod testing;
