use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::use_cases::CollectionStatsUseCase;
use crate::presentation::http::dto::{ApiResponse, CollectionStatsDto};
use crate::presentation::http::errors::AppError;

pub struct CollectionHandler {
    stats_use_case: Arc<CollectionStatsUseCase>,
}

impl CollectionHandler {
    pub fn new(stats_use_case: Arc<CollectionStatsUseCase>) -> Self {
        Self { stats_use_case }
    }

    pub async fn stats(
        State(handler): State<Arc<CollectionHandler>>,
    ) -> Result<impl IntoResponse, AppError> {
        let stats = handler.stats_use_case.execute().await?;

        Ok((
            StatusCode::OK,
            Json(ApiResponse::success(CollectionStatsDto::from(stats))),
        ))
    }
}
