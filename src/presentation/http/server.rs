use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::infrastructure::config::ServerConfig;
use crate::presentation::http::{
    handlers::{AskHandler, CollectionHandler, IngestHandler},
    routes::{collection_routes, health_routes, pdf_routes},
};

pub struct HttpServer {
    ingest_handler: Arc<IngestHandler>,
    ask_handler: Arc<AskHandler>,
    collection_handler: Arc<CollectionHandler>,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(
        ingest_handler: Arc<IngestHandler>,
        ask_handler: Arc<AskHandler>,
        collection_handler: Arc<CollectionHandler>,
        config: ServerConfig,
    ) -> Self {
        Self {
            ingest_handler,
            ask_handler,
            collection_handler,
            config,
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(health_routes())
            .merge(pdf_routes(
                self.ingest_handler.clone(),
                self.ask_handler.clone(),
            ))
            .merge(collection_routes(self.collection_handler.clone()))
            .layer(cors)
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(RequestBodyLimitLayer::new(self.config.max_upload_bytes))
            .layer(
                TraceLayer::new_for_http()
                    .on_request(
                        |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                            tracing::info!(
                                "Received request: {} {}",
                                request.method(),
                                request.uri()
                            );
                        },
                    )
                    .on_response(
                        |response: &axum::http::Response<axum::body::Body>,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::info!(
                                "Response: {} (took {} ms)",
                                response.status(),
                                latency.as_millis()
                            );
                        },
                    )
                    .on_failure(
                        |error: ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                "Request failed: {:?} (took {} ms)",
                                error,
                                latency.as_millis()
                            );
                        },
                    ),
            )
    }

    /// Serves until ctrl-c.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
