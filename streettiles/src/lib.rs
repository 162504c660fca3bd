//! StreetTiles - street-network vector tiles generated on demand
//!
//! This library turns OpenStreetMap data into layered Mapbox Vector Tiles
//! (`geometry`, `lanePolygons`, `laneMarkings`, `intersectionMarkings`)
//! and serves them over HTTP.
//!
//! # High-Level API
//!
//! [`service::TileService`] resolves a tile coordinate to encoded bytes,
//! generating the street network for the surrounding index tile at most
//! once and caching both networks and tiles:
//!
//! ```ignore
//! use streettiles::app::{AppConfig, StreetTilesApp};
//! use streettiles::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let app = StreetTilesApp::start(config).await?;
//! app.wait().await?;
//! ```

pub mod app;
pub mod cache;
pub mod config;
pub mod coord;
pub mod logging;
pub mod network;
pub mod provider;
pub mod server;
pub mod service;
pub mod tile;

/// Version of the StreetTiles library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
