//! Provider types and traits

use std::fmt;
use std::future::Future;

use crate::coord::TileCoord;

/// Errors that can occur while fetching raw street data.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP request failed (transport error or unexpected status)
    HttpError(String),
    /// The upstream service asked us to back off
    RateLimited(String),
    /// Invalid response data from provider
    InvalidResponse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Fetches the raw street data covering one index tile.
///
/// Implementations are shared across requests and generation tasks, so the
/// returned future must be `Send` and the fetcher itself `Send + Sync`.
pub trait DataFetcher: Send + Sync {
    /// Downloads raw data for the area covered by `area`.
    ///
    /// # Arguments
    ///
    /// * `area` - The quantized index tile whose bounding box to fetch
    ///
    /// # Returns
    ///
    /// The raw response body, handed unchanged to the network deriver.
    fn fetch(&self, area: TileCoord) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Returns the fetcher's name for logging and identification.
    fn name(&self) -> &str;
}
