//! Overpass API fetcher.
//!
//! Downloads every OSM node, way and relation inside an index tile's
//! bounding box, together with the nodes referenced by those ways and the
//! parents of everything found, as Overpass JSON.

use std::time::Instant;

use reqwest::Url;
use tracing::{debug, info};

use super::http::AsyncHttpClient;
use super::types::{DataFetcher, ProviderError};
use crate::coord::TileCoord;

/// Default Overpass instance.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass.kumi.systems";

/// Default server-side query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u32 = 180;

/// Fetches raw OSM data for an index tile from an Overpass API instance.
pub struct OverpassFetcher<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
    query_timeout_secs: u32,
}

impl<C: AsyncHttpClient> OverpassFetcher<C> {
    /// Creates a new fetcher against the given Overpass base URL
    /// (e.g. `https://overpass.kumi.systems`).
    pub fn new(http_client: C, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }

    /// Sets the `[timeout:N]` value sent with each query.
    pub fn with_query_timeout(mut self, secs: u32) -> Self {
        self.query_timeout_secs = secs;
        self
    }

    /// Base URL of the Overpass instance.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the Overpass QL query for a tile's bounding box.
    ///
    /// The bbox order is south, west, north, east.
    pub fn build_query(&self, area: TileCoord) -> String {
        let b = area.bounds();
        format!(
            "[out:json][timeout:{}];(nwr({:.7},{:.7},{:.7},{:.7});node(w)->.x;<;);out meta;",
            self.query_timeout_secs, b.south, b.west, b.north, b.east
        )
    }

    /// Builds the full interpreter URL with the query URL-encoded.
    pub fn build_url(&self, area: TileCoord) -> Result<Url, ProviderError> {
        let endpoint = format!("{}/api/interpreter", self.base_url.trim_end_matches('/'));
        Url::parse_with_params(&endpoint, &[("data", self.build_query(area))]).map_err(|e| {
            ProviderError::HttpError(format!("Invalid Overpass URL '{}': {}", endpoint, e))
        })
    }
}

impl<C: AsyncHttpClient> DataFetcher for OverpassFetcher<C> {
    async fn fetch(&self, area: TileCoord) -> Result<Vec<u8>, ProviderError> {
        let url = self.build_url(area)?;
        let start = Instant::now();

        debug!(area = %area, "Querying Overpass");
        let body = self.http_client.get(url.as_str()).await?;

        if body.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "Empty Overpass response for {}",
                area
            )));
        }

        info!(
            area = %area,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched street data"
        );
        Ok(body)
    }

    fn name(&self) -> &str {
        "Overpass"
    }
}
