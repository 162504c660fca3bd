//! Tile service error types.

use thiserror::Error;

use crate::coord::{CoordError, TileCoord};
use crate::network::DeriveError;
use crate::provider::ProviderError;
use crate::tile::EncodeError;

/// Errors returned by [`TileService`](super::TileService).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// A request parameter is not a valid tile coordinate component
    #[error("Invalid {name} parameter '{value}': {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// The request is coarser than the zoom networks are generated at
    #[error("Zoom {zoom} is not supported; tiles are served from zoom {index_zoom} upwards")]
    ZoomTooCoarse { zoom: u8, index_zoom: u8 },

    /// Raw data could not be fetched
    #[error("Failed to fetch street data: {0}")]
    DataFetchFailure(#[from] ProviderError),

    /// The street network could not be derived
    #[error("Failed to derive street network: {0}")]
    DerivationFailure(#[from] DeriveError),

    /// A layer had no tile for the requested coordinate
    #[error("Missing layer '{layer}' for tile {coord}")]
    MissingLayer {
        layer: &'static str,
        coord: TileCoord,
    },

    /// The tile writer failed
    #[error("Tile encoding failed: {0}")]
    EncodingFailure(String),

    /// The network cache did not hold what was just written to it
    #[error("Network cache returned a different entry for {key} right after it was written")]
    CacheConsistency { key: TileCoord },

    /// A spawned generation or encoding task panicked or was cancelled
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl ServiceError {
    /// Builds an `InvalidParameter` from a coordinate validation failure.
    pub fn from_coord_error(error: &CoordError, value: impl ToString) -> Self {
        ServiceError::InvalidParameter {
            name: error.field(),
            value: value.to_string(),
            reason: error.to_string(),
        }
    }
}

impl From<EncodeError> for ServiceError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::MissingLayer { layer, coord } => ServiceError::MissingLayer { layer, coord },
            EncodeError::EncodingFailure(msg) => ServiceError::EncodingFailure(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_from_coord_error() {
        let err = ServiceError::from_coord_error(&CoordError::InvalidX { x: 9, zoom: 1 }, 9);
        match &err {
            ServiceError::InvalidParameter { name, value, .. } => {
                assert_eq!(*name, "x");
                assert_eq!(value, "9");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(err.to_string().starts_with("Invalid x parameter '9'"));
    }

    #[test]
    fn test_encode_error_conversion() {
        let coord = TileCoord { zoom: 17, x: 1, y: 2 };
        let err: ServiceError = EncodeError::MissingLayer {
            layer: "geometry",
            coord,
        }
        .into();
        assert_eq!(
            err,
            ServiceError::MissingLayer {
                layer: "geometry",
                coord
            }
        );

        let err: ServiceError = EncodeError::EncodingFailure("bad".to_string()).into();
        assert_eq!(err, ServiceError::EncodingFailure("bad".to_string()));
    }

    #[test]
    fn test_provider_and_derive_conversions() {
        let err: ServiceError = ProviderError::RateLimited("429".to_string()).into();
        assert!(matches!(err, ServiceError::DataFetchFailure(_)));

        let err: ServiceError = DeriveError::Malformed("eof".to_string()).into();
        assert!(matches!(err, ServiceError::DerivationFailure(_)));
    }
}
