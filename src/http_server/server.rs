//! # HTTP Server
//!
//! Builds the router over a `FileService` and runs it until Ctrl-C, then
//! closes the store.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::config::HttpServerConfig;
use super::file_routes::{file_routes, FileState};
use super::observability_routes::health_routes;
use crate::file_storage::FileService;

/// HTTP server for the file store
pub struct HttpServer {
    config: HttpServerConfig,
    service: FileService,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, service: FileService) -> Self {
        let router = Self::build_router(&config, service.clone());
        Self {
            config,
            service,
            router,
        }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, service: FileService) -> Router {
        let file_state = Arc::new(FileState::new(service));

        let router = Router::new()
            .merge(health_routes())
            .merge(file_routes(file_state))
            .layer(DefaultBodyLimit::max(config.max_upload_bytes))
            .layer(TraceLayer::new_for_http());

        if config.cors_origins.is_empty() {
            return router;
        }

        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        router.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any),
        )
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C, then close the store.
    ///
    /// Binding failures are returned before any request is accepted.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        let addr: SocketAddr = listener.local_addr()?;
        info!(%addr, "aerostore listening");

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        self.service.close();
        info!("server stopped");
        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
