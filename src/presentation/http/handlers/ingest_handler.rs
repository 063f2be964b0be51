use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

use crate::application::use_cases::{IngestPdfUseCase, ingest_pdf::IngestPdfRequest};
use crate::presentation::http::dto::UploadPdfResponseDto;
use crate::presentation::http::errors::AppError;

const FILE_FIELD: &str = "file";

pub struct IngestHandler {
    ingest_use_case: Arc<IngestPdfUseCase>,
}

impl IngestHandler {
    pub fn new(ingest_use_case: Arc<IngestPdfUseCase>) -> Self {
        Self { ingest_use_case }
    }

    /// Ingests the first file part of the form: the `file` field, or any
    /// part that carries a filename.
    pub async fn upload_pdf(
        State(handler): State<Arc<IngestHandler>>,
        mut multipart: Multipart,
    ) -> Result<impl IntoResponse, AppError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::new(e.status(), "INVALID_MULTIPART", e.body_text()))?
        {
            if field.name() != Some(FILE_FIELD) && field.file_name().is_none() {
                continue;
            }

            let file_name = field.file_name().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::new(e.status(), "INVALID_MULTIPART", e.body_text()))?
                .to_vec();

            let request = IngestPdfRequest {
                file_name,
                file_data: data,
            };

            let response = handler.ingest_use_case.execute(request).await?;
            info!(
                "Processed upload into {} chunks ({} text, {} table) in {} ms",
                response.chunks,
                response.text_chunks,
                response.table_chunks,
                response.processing_time_ms
            );
            return Ok((StatusCode::OK, Json(UploadPdfResponseDto::from(response))));
        }

        Err(AppError::bad_request(
            "NO_FILE_PROVIDED",
            "No file provided in the request",
        ))
    }
}
