use std::sync::Arc;
use std::time::Instant;

use crate::application::services::{RetrievalService, retrieval_service::RetrievalError};

#[derive(Debug)]
pub enum AskQuestionError {
    ValidationError(String),
    EmbeddingError(String),
    CollectionError(String),
    MissingCredential(String),
    CompletionError(String),
}

impl std::fmt::Display for AskQuestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AskQuestionError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AskQuestionError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            AskQuestionError::CollectionError(msg) => write!(f, "Collection error: {}", msg),
            AskQuestionError::MissingCredential(msg) => write!(f, "Credential error: {}", msg),
            AskQuestionError::CompletionError(msg) => write!(f, "Completion error: {}", msg),
        }
    }
}

impl std::error::Error for AskQuestionError {}

impl From<RetrievalError> for AskQuestionError {
    fn from(error: RetrievalError) -> Self {
        match error {
            RetrievalError::EmbeddingError(msg) => AskQuestionError::EmbeddingError(msg),
            RetrievalError::CollectionError(msg) => AskQuestionError::CollectionError(msg),
            RetrievalError::MissingCredential(msg) => AskQuestionError::MissingCredential(msg),
            RetrievalError::CompletionError(msg) => AskQuestionError::CompletionError(msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AskQuestionRequest {
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct AskQuestionResponse {
    pub answer: String,
    pub context: String,
    pub retrieved: usize,
    pub answer_time_ms: u64,
}

pub struct AskQuestionUseCase {
    retrieval_service: Arc<RetrievalService>,
}

impl AskQuestionUseCase {
    pub fn new(retrieval_service: Arc<RetrievalService>) -> Self {
        Self { retrieval_service }
    }

    pub async fn execute(
        &self,
        request: AskQuestionRequest,
    ) -> Result<AskQuestionResponse, AskQuestionError> {
        let start_time = Instant::now();

        if request.query.is_empty() {
            return Err(AskQuestionError::ValidationError(
                "Query cannot be empty".to_string(),
            ));
        }

        let grounded = self.retrieval_service.answer(&request.query).await?;

        Ok(AskQuestionResponse {
            answer: grounded.answer,
            context: grounded.context,
            retrieved: grounded.matches.len(),
            answer_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}
