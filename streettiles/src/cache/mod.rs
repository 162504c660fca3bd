//! Two-tier in-memory caching for the tile pipeline.
//!
//! A single generic store, [`MemoryCache`], keyed by [`TileCoord`], is
//! instantiated twice by the service:
//!
//! - the **tile cache** holds encoded tile bytes for every requested tile
//! - the **network cache** holds one derived street network (or a
//!   "generating" marker) per quantized index tile
//!
//! Both are bounded by entry count with an optional time-to-live; eviction
//! is handled by moka and is never relied upon for correctness.
//!
//! [`TileCoord`]: crate::coord::TileCoord

mod config;
mod memory;
mod stats;

pub use config::{
    CacheConfig, DEFAULT_CACHE_TTL, DEFAULT_NETWORK_CACHE_ENTRIES, DEFAULT_TILE_CACHE_ENTRIES,
};
pub use memory::MemoryCache;
pub use stats::CacheStats;
