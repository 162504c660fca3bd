//! Application bootstrap implementation.
//!
//! `StreetTilesApp` wires the Overpass fetcher, the OSM deriver and both
//! caches into a [`TileService`], then serves it over HTTP until shut down.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::network::OsmNetworkDeriver;
use crate::provider::{AsyncReqwestClient, OverpassFetcher};
use crate::server;
use crate::service::TileService;

/// Tile service backed by Overpass and the OSM street deriver.
pub type DefaultTileService = TileService<OverpassFetcher<AsyncReqwestClient>, OsmNetworkDeriver>;

/// Running tile server with lifecycle management.
///
/// # Example
///
/// ```ignore
/// use streettiles::app::{AppConfig, StreetTilesApp};
///
/// let app = StreetTilesApp::start(config).await?;
/// println!("listening on {}", app.local_addr());
///
/// // Later: graceful shutdown
/// app.shutdown().await?;
/// ```
pub struct StreetTilesApp {
    /// Shared tile service (also reachable for in-process requests).
    service: Arc<DefaultTileService>,

    /// Address the listener actually bound (resolves port 0).
    local_addr: SocketAddr,

    /// Cancelled to stop accepting connections.
    shutdown: CancellationToken,

    /// The axum server task.
    server_task: JoinHandle<std::io::Result<()>>,
}

impl StreetTilesApp {
    /// Builds the service and starts serving it.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the listen
    /// address cannot be bound.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        info!(
            index_zoom = config.service.index_zoom,
            overpass = %config.overpass.url,
            "Starting tile server"
        );

        let service = Arc::new(build_service(&config)?);

        let address = config.server.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| AppError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| AppError::Bind {
            address: address.clone(),
            source,
        })?;

        let shutdown = CancellationToken::new();
        let server_task = tokio::spawn(server::serve(
            listener,
            Arc::clone(&service),
            shutdown.clone(),
        ));

        info!(addr = %local_addr, "Tile server started");

        Ok(Self {
            service,
            local_addr,
            shutdown,
            server_task,
        })
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The shared tile service.
    pub fn service(&self) -> Arc<DefaultTileService> {
        Arc::clone(&self.service)
    }

    /// Token that stops the server when cancelled.
    pub fn cancellation(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Waits until the server stops (after [`cancellation`](Self::cancellation)
    /// fires or on a fatal I/O error).
    pub async fn wait(self) -> Result<(), AppError> {
        join_server(self.server_task).await
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn shutdown(self) -> Result<(), AppError> {
        info!("Shutting down tile server");
        self.shutdown.cancel();
        let result = join_server(self.server_task).await;
        info!("Tile server shutdown complete");
        result
    }
}

/// Builds the production tile service from `config`.
pub fn build_service(config: &AppConfig) -> Result<DefaultTileService, AppError> {
    let http_client = AsyncReqwestClient::with_timeout(config.overpass.http_timeout_secs())?;
    let fetcher = OverpassFetcher::new(http_client, config.overpass.url.clone())
        .with_query_timeout(config.overpass.timeout_secs);

    Ok(TileService::new(
        config.service.clone(),
        fetcher,
        OsmNetworkDeriver::new(),
    ))
}

async fn join_server(task: JoinHandle<std::io::Result<()>>) -> Result<(), AppError> {
    task.await
        .map_err(|e| AppError::Server(e.to_string()))?
        .map_err(|e| AppError::Server(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceConfig;

    fn test_config() -> AppConfig {
        AppConfig::new(ServiceConfig::default())
            .with_server("127.0.0.1", 0)
            .with_overpass_url("http://127.0.0.1:9")
    }

    #[tokio::test]
    async fn test_app_start_and_shutdown() {
        let app = StreetTilesApp::start(test_config()).await.unwrap();

        assert!(app.local_addr().port() != 0);
        assert_eq!(app.service().stats().tiles.entry_count, 0);

        app.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancellation_ends_wait() {
        let app = StreetTilesApp::start(test_config()).await.unwrap();
        let token = app.cancellation();

        token.cancel();
        app.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let first = StreetTilesApp::start(test_config()).await.unwrap();
        let taken = first.local_addr().port();

        let err = StreetTilesApp::start(test_config().with_server("127.0.0.1", taken))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Bind { .. }));

        first.shutdown().await.unwrap();
    }

    #[test]
    fn test_build_service_uses_config() {
        let config = test_config();
        let service = build_service(&config).unwrap();
        assert_eq!(service.config().index_zoom, 16);
    }
}
