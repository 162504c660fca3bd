//! Application bootstrap and lifecycle management.
//!
//! `StreetTilesApp` builds every component in one place and owns the HTTP
//! server task:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     StreetTilesApp                        │
//! │                                                           │
//! │  AsyncReqwestClient ─► OverpassFetcher ─┐                 │
//! │  OsmNetworkDeriver ─────────────────────┼─► TileService   │
//! │  MemoryCache (tiles, networks) ─────────┘        │        │
//! │                                                  ▼        │
//! │  TcpListener ─► axum router ◄──────── Arc<TileService>    │
//! │                     ▲                                     │
//! │  CancellationToken ─┘ (graceful shutdown)                 │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{build_service, DefaultTileService, StreetTilesApp};
pub use config::{AppConfig, OverpassAppConfig, ServerAppConfig, HTTP_TIMEOUT_MARGIN_SECS};
pub use error::AppError;
