use axum::{Router, routing::get};
use std::sync::Arc;

use crate::presentation::http::handlers::CollectionHandler;

pub fn collection_routes(collection_handler: Arc<CollectionHandler>) -> Router {
    Router::new()
        .route("/collection", get(CollectionHandler::stats))
        .with_state(collection_handler)
}
