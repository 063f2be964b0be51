use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

use crate::application::use_cases::{AskQuestionUseCase, ask_question::AskQuestionRequest};
use crate::presentation::http::dto::{AskRequestDto, AskResponseDto};
use crate::presentation::http::errors::AppError;

pub struct AskHandler {
    ask_use_case: Arc<AskQuestionUseCase>,
}

impl AskHandler {
    pub fn new(ask_use_case: Arc<AskQuestionUseCase>) -> Self {
        Self { ask_use_case }
    }

    pub async fn ask(
        State(handler): State<Arc<AskHandler>>,
        form: Result<Form<AskRequestDto>, FormRejection>,
    ) -> Result<impl IntoResponse, AppError> {
        let Form(form) = form.map_err(|e| AppError::bad_request("INVALID_FORM", e.body_text()))?;

        let request = AskQuestionRequest { query: form.query };
        let response = handler.ask_use_case.execute(request).await?;

        info!(
            "Answered from {} passages in {} ms",
            response.retrieved, response.answer_time_ms
        );

        Ok((StatusCode::OK, Json(AskResponseDto::from(response))))
    }
}
