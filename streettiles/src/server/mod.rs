//! HTTP surface of the tile server.
//!
//! | Route                  | Response                                   |
//! |------------------------|--------------------------------------------|
//! | `GET /`                | plain-text greeting                        |
//! | `GET /tile/:zoom/:x/:y`| encoded vector tile (`application/octet-stream`) |
//! | `GET /stats`           | cache statistics as JSON                   |
//!
//! Failures are returned as plain text carrying the error's display
//! message, with the status chosen by [`status_for`].

use std::io;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::network::NetworkDeriver;
use crate::provider::DataFetcher;
use crate::service::{ServiceError, ServiceStats, TileService};

/// Body of `GET /`.
pub const GREETING: &str = "Hello world!";

/// Content type of encoded tiles.
pub const TILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Builds the router over a shared tile service.
pub fn router<F, D>(service: Arc<TileService<F, D>>) -> Router
where
    F: DataFetcher + 'static,
    D: NetworkDeriver + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/tile/:zoom/:x/:y", get(tile::<F, D>))
        .route("/stats", get(stats::<F, D>))
        .with_state(service)
}

/// Serves `service` on `listener` until `shutdown` is cancelled.
pub async fn serve<F, D>(
    listener: TcpListener,
    service: Arc<TileService<F, D>>,
    shutdown: CancellationToken,
) -> io::Result<()>
where
    F: DataFetcher + 'static,
    D: NetworkDeriver + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Tile server listening");
    }

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Tile server stopped");
    Ok(())
}

async fn index() -> &'static str {
    GREETING
}

async fn tile<F, D>(
    State(service): State<Arc<TileService<F, D>>>,
    Path((zoom, x, y)): Path<(String, String, String)>,
) -> Result<Response, ServiceError>
where
    F: DataFetcher + 'static,
    D: NetworkDeriver + 'static,
{
    let bytes = service.resolve_tile_params(&zoom, &x, &y).await?;
    Ok((
        [
            (header::CONTENT_TYPE, TILE_CONTENT_TYPE),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        bytes,
    )
        .into_response())
}

async fn stats<F, D>(State(service): State<Arc<TileService<F, D>>>) -> Json<ServiceStats>
where
    F: DataFetcher + 'static,
    D: NetworkDeriver + 'static,
{
    Json(service.stats())
}

/// HTTP status for a failed tile request.
pub fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        ServiceError::ZoomTooCoarse { .. } => StatusCode::NOT_IMPLEMENTED,
        ServiceError::DataFetchFailure(_) | ServiceError::DerivationFailure(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ServiceError::MissingLayer { .. }
        | ServiceError::EncodingFailure(_)
        | ServiceError::CacheConsistency { .. }
        | ServiceError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Tile request failed");
        }
        (status, self.to_string()).into_response()
    }
}
