use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::application::use_cases::{ask_question::AskQuestionError, ingest_pdf::IngestPdfError};
use crate::domain::repositories::vector_collection::CollectionError;
use crate::presentation::http::dto::ApiResponse;

/// An error already mapped to the status and code a client sees.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        (
            self.status,
            Json(ApiResponse::<()>::error(
                self.code.to_string(),
                self.message,
            )),
        )
            .into_response()
    }
}

impl From<IngestPdfError> for AppError {
    fn from(error: IngestPdfError) -> Self {
        let message = error.to_string();
        match error {
            IngestPdfError::ValidationError(_) => Self::bad_request("INVALID_UPLOAD", message),
            IngestPdfError::StorageError(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILED", message)
            }
            IngestPdfError::ExtractionError(_) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_FAILED",
                message,
            ),
            IngestPdfError::EmbeddingError(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "EMBEDDING_FAILED", message)
            }
            IngestPdfError::CollectionError(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "COLLECTION_FAILED", message)
            }
        }
    }
}

impl From<AskQuestionError> for AppError {
    fn from(error: AskQuestionError) -> Self {
        let message = error.to_string();
        match error {
            AskQuestionError::ValidationError(_) => Self::bad_request("EMPTY_QUERY", message),
            AskQuestionError::EmbeddingError(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "EMBEDDING_FAILED", message)
            }
            AskQuestionError::CollectionError(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "COLLECTION_FAILED", message)
            }
            AskQuestionError::MissingCredential(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "MISSING_CREDENTIAL",
                message,
            ),
            AskQuestionError::CompletionError(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "COMPLETION_FAILED", message)
            }
        }
    }
}

impl From<CollectionError> for AppError {
    fn from(error: CollectionError) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "COLLECTION_FAILED",
            error.to_string(),
        )
    }
}
