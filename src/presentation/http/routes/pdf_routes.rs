use axum::{Router, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::{AskHandler, IngestHandler};

pub fn pdf_routes(ingest_handler: Arc<IngestHandler>, ask_handler: Arc<AskHandler>) -> Router {
    Router::new()
        .route("/upload_pdf/", post(IngestHandler::upload_pdf))
        .with_state(ingest_handler)
        .merge(
            Router::new()
                .route("/ask/", post(AskHandler::ask))
                .with_state(ask_handler),
        )
}
