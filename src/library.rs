//! Track catalog: built-in tracks, imported files, and their persistence.
//!
//! The session core only needs [`TrackCatalog::load_catalog`]; importing and
//! removing files is driven by the UI/CLI and never reaches the session.

mod catalog;
mod display;
mod import;
mod model;
mod scan;
mod store;

pub use catalog::{Catalog, TrackCatalog};
pub use display::{format_duration, format_size};
pub use import::ImportError;
pub use model::*;
pub use store::{ImportRecord, ImportStore};

#[cfg(test)]
mod tests;
