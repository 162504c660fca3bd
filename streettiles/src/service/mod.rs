//! The tile service: caches, generation coordination and encoding.
//!
//! [`TileService`] is the single entry point the HTTP layer and the CLI use
//! to turn a tile coordinate into encoded bytes.

mod config;
mod coordinator;
mod error;

pub use config::{ServiceConfig, DEFAULT_INDEX_ZOOM, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};
pub use coordinator::{ServiceStats, TileService};
pub use error::ServiceError;
