//! Tile request pipeline.
//!
//! [`TileService`] resolves a tile request through two caches:
//!
//! ```text
//! request (z/x/y)
//!   -> tile cache hit?                       return bytes
//!   -> quantize to the index zoom            (network cache key)
//!   -> network cache: Ready                  use it
//!                     Generating             poll until Ready or max_wait
//!                     absent                 claim with Generating, generate
//!   -> encode all layers for z/x/y
//!   -> store bytes in the tile cache, return
//! ```
//!
//! Many fine tiles map onto one index tile, so the network cache is what
//! keeps a burst of neighbouring requests from fetching and deriving the
//! same area more than once. The `Generating` marker is claimed with a
//! single atomic insert-if-absent; waiters poll it and, if the owner never
//! finishes within `max_wait`, take over and regenerate themselves.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::config::ServiceConfig;
use super::error::ServiceError;
use crate::cache::{CacheStats, MemoryCache};
use crate::coord::{quantize, TileCoord};
use crate::network::{NetworkDeriver, NetworkEntry, StreetNetwork};
use crate::provider::DataFetcher;
use crate::tile::LayeredTileEncoder;

/// Statistics for both caches of a [`TileService`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStats {
    pub tiles: CacheStats,
    pub networks: CacheStats,
}

enum WaitOutcome {
    Ready(Arc<StreetNetwork>),
    /// The entry disappeared (evicted or cleared) while we were waiting.
    Vanished,
    TimedOut,
}

/// Resolves tile coordinates to encoded vector tiles.
pub struct TileService<F, D> {
    config: ServiceConfig,
    tile_cache: Arc<MemoryCache<Bytes>>,
    network_cache: Arc<MemoryCache<NetworkEntry>>,
    fetcher: Arc<F>,
    deriver: Arc<D>,
    encoder: LayeredTileEncoder,
}

impl<F, D> TileService<F, D>
where
    F: DataFetcher + 'static,
    D: NetworkDeriver + 'static,
{
    /// Creates a service with fresh caches sized from `config`.
    pub fn new(config: ServiceConfig, fetcher: F, deriver: D) -> Self {
        let tile_cache = Arc::new(MemoryCache::new(config.tile_cache.clone()));
        let network_cache = Arc::new(MemoryCache::new(config.network_cache.clone()));
        Self::with_caches(
            config,
            tile_cache,
            network_cache,
            Arc::new(fetcher),
            Arc::new(deriver),
        )
    }

    /// Creates a service over existing caches and collaborators.
    pub fn with_caches(
        config: ServiceConfig,
        tile_cache: Arc<MemoryCache<Bytes>>,
        network_cache: Arc<MemoryCache<NetworkEntry>>,
        fetcher: Arc<F>,
        deriver: Arc<D>,
    ) -> Self {
        let encoder = LayeredTileEncoder::new(config.index);
        Self {
            config,
            tile_cache,
            network_cache,
            fetcher,
            deriver,
            encoder,
        }
    }

    /// Replaces the tile encoder.
    pub fn with_encoder(mut self, encoder: LayeredTileEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn tile_cache(&self) -> &Arc<MemoryCache<Bytes>> {
        &self.tile_cache
    }

    pub fn network_cache(&self) -> &Arc<MemoryCache<NetworkEntry>> {
        &self.network_cache
    }

    /// Resolves a tile from unparsed path parameters.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidParameter`] naming the first parameter that is
    /// not a non-negative decimal integer of the right size, otherwise
    /// whatever [`resolve_tile`](Self::resolve_tile) returns.
    pub async fn resolve_tile_params(
        &self,
        zoom: &str,
        x: &str,
        y: &str,
    ) -> Result<Bytes, ServiceError> {
        let coord = TileCoord {
            zoom: parse_param("zoom", zoom)?,
            x: parse_param("x", x)?,
            y: parse_param("y", y)?,
        };
        self.resolve_tile(coord).await
    }

    /// Returns the encoded tile at `coord`, generating it if needed.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidParameter`] if `coord` is outside the grid
    /// - [`ServiceError::ZoomTooCoarse`] if `coord.zoom` is below the index zoom
    /// - fetch, derivation, encoding and cache consistency failures
    #[instrument(skip_all, fields(tile = %coord))]
    pub async fn resolve_tile(&self, coord: TileCoord) -> Result<Bytes, ServiceError> {
        let coord = validate(coord)?;

        if let Some(bytes) = self.tile_cache.get(&coord).await {
            debug!(bytes = bytes.len(), "Tile cache hit");
            return Ok(bytes);
        }

        let index_zoom = self.config.index_zoom;
        let key = quantize(coord, index_zoom).map_err(|_| ServiceError::ZoomTooCoarse {
            zoom: coord.zoom,
            index_zoom,
        })?;

        let network = self.resolve_network(key).await?;

        let start = Instant::now();
        let encoder = self.encoder.clone();
        let bytes = tokio::task::spawn_blocking(move || encoder.encode(&network, coord))
            .await
            .map_err(|e| ServiceError::TaskFailed(e.to_string()))??;

        self.tile_cache.put(coord, bytes.clone()).await;
        debug!(
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Encoded tile"
        );
        Ok(bytes)
    }

    /// Returns the street network for index tile `key`.
    ///
    /// At most one caller generates a given key at a time unless a
    /// generation overruns `max_wait`, in which case a waiter regenerates.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn resolve_network(&self, key: TileCoord) -> Result<Arc<StreetNetwork>, ServiceError> {
        let deadline = Instant::now() + self.config.max_wait;

        loop {
            match self
                .network_cache
                .insert_if_absent(key, NetworkEntry::Generating)
                .await
            {
                Some(NetworkEntry::Ready(network)) => {
                    debug!("Network cache hit");
                    return Ok(network);
                }
                None => {
                    debug!("Claimed network generation");
                    return self.generate_network(key).await;
                }
                Some(NetworkEntry::Generating) => {
                    debug!("Network is being generated elsewhere, waiting");
                }
            }

            match self.wait_for_network(key, deadline).await {
                WaitOutcome::Ready(network) => return Ok(network),
                WaitOutcome::Vanished => {
                    debug!("Network entry vanished while waiting, reclaiming");
                }
                WaitOutcome::TimedOut => {
                    warn!(
                        waited_ms = self.config.max_wait.as_millis() as u64,
                        "Timed out waiting for network generation, regenerating"
                    );
                    return self.take_over(key).await;
                }
            }
        }
    }

    /// Re-marks `key` as generating and regenerates it, unless a network
    /// became ready since the last poll.
    async fn take_over(&self, key: TileCoord) -> Result<Arc<StreetNetwork>, ServiceError> {
        let kept = self
            .network_cache
            .replace_if(key, NetworkEntry::Generating, |current| {
                matches!(current, NetworkEntry::Generating)
            })
            .await;

        if let Some(NetworkEntry::Ready(network)) = kept {
            debug!("Network became ready during takeover");
            return Ok(network);
        }
        self.generate_network(key).await
    }

    /// Statistics for both caches.
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            tiles: self.tile_cache.stats(),
            networks: self.network_cache.stats(),
        }
    }

    /// Empties both caches.
    pub fn clear_caches(&self) {
        self.tile_cache.clear();
        self.network_cache.clear();
        info!("Cleared tile and network caches");
    }

    async fn wait_for_network(&self, key: TileCoord, deadline: Instant) -> WaitOutcome {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut;
            }
            tokio::time::sleep(self.config.poll_interval.min(deadline - now)).await;

            match self.network_cache.get(&key).await {
                Some(NetworkEntry::Ready(network)) => return WaitOutcome::Ready(network),
                Some(NetworkEntry::Generating) => {}
                None => return WaitOutcome::Vanished,
            }
        }
    }

    /// Runs generation on its own task so a dropped request does not
    /// abandon it; other waiters still pick up the result.
    async fn generate_network(&self, key: TileCoord) -> Result<Arc<StreetNetwork>, ServiceError> {
        let task = generate(
            key,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.deriver),
            Arc::clone(&self.network_cache),
        );
        tokio::spawn(task)
            .await
            .map_err(|e| ServiceError::TaskFailed(e.to_string()))?
    }
}

async fn generate<F, D>(
    key: TileCoord,
    fetcher: Arc<F>,
    deriver: Arc<D>,
    cache: Arc<MemoryCache<NetworkEntry>>,
) -> Result<Arc<StreetNetwork>, ServiceError>
where
    F: DataFetcher + 'static,
    D: NetworkDeriver + 'static,
{
    let start = Instant::now();
    info!(key = %key, source = fetcher.name(), "Generating street network");

    // On failure the Generating marker is left in place; waiters time out
    // and regenerate.
    let raw = fetcher.fetch(key).await.map_err(|e| {
        warn!(key = %key, error = %e, "Street data fetch failed");
        ServiceError::from(e)
    })?;
    let fetch_ms = start.elapsed().as_millis() as u64;

    let derived = tokio::task::spawn_blocking(move || deriver.derive(key, &raw))
        .await
        .map_err(|e| ServiceError::TaskFailed(e.to_string()))?;
    let network = Arc::new(derived.map_err(|e| {
        warn!(key = %key, error = %e, "Street network derivation failed");
        ServiceError::from(e)
    })?);

    cache
        .put(key, NetworkEntry::Ready(Arc::clone(&network)))
        .await;
    verify_stored(&cache, key, &network).await?;

    info!(
        key = %key,
        features = network.feature_count(),
        fetch_ms,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Street network ready"
    );
    Ok(network)
}

/// Reads `key` back and checks it holds exactly `network`.
async fn verify_stored(
    cache: &MemoryCache<NetworkEntry>,
    key: TileCoord,
    network: &Arc<StreetNetwork>,
) -> Result<(), ServiceError> {
    match cache.get(&key).await {
        Some(NetworkEntry::Ready(stored)) if Arc::ptr_eq(&stored, network) => Ok(()),
        other => {
            error!(
                key = %key,
                found = match other {
                    Some(NetworkEntry::Ready(_)) => "another network",
                    Some(NetworkEntry::Generating) => "generating marker",
                    None => "nothing",
                },
                "Network cache did not return the network just written"
            );
            Err(ServiceError::CacheConsistency { key })
        }
    }
}

fn validate(coord: TileCoord) -> Result<TileCoord, ServiceError> {
    TileCoord::new(coord.zoom, coord.x, coord.y).map_err(|e| {
        let value = match e.field() {
            "x" => coord.x.to_string(),
            "y" => coord.y.to_string(),
            _ => coord.zoom.to_string(),
        };
        ServiceError::from_coord_error(&e, value)
    })
}

fn parse_param<T>(name: &'static str, value: &str) -> Result<T, ServiceError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| ServiceError::InvalidParameter {
        name,
        value: value.to_string(),
        reason: format!("not a valid number ({})", e),
    })
}
