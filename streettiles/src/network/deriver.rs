//! Network derivation trait and errors.

use thiserror::Error;

use super::StreetNetwork;
use crate::coord::TileCoord;

/// Errors produced while turning raw area data into a street network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeriveError {
    /// Input could not be parsed
    #[error("Malformed street data: {0}")]
    Malformed(String),

    /// Input parsed but holds nothing to build a network from
    #[error("No street data found for area {0}")]
    EmptyInput(TileCoord),
}

/// Derives a [`StreetNetwork`] from the raw data fetched for one area.
///
/// Derivation is CPU-bound and synchronous; the service runs it on the
/// blocking thread pool.
pub trait NetworkDeriver: Send + Sync {
    /// Builds the network for `area` from `raw`.
    ///
    /// # Errors
    ///
    /// - [`DeriveError::Malformed`] if `raw` cannot be parsed
    /// - [`DeriveError::EmptyInput`] if `raw` contains no usable data
    fn derive(&self, area: TileCoord, raw: &[u8]) -> Result<StreetNetwork, DeriveError>;
}
