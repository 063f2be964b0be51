use std::sync::Arc;
use tracing::{debug, info};

use crate::application::ports::{
    CompletionProvider, EmbeddingProvider,
    completion_provider::{CompletionProviderError, CompletionRequest},
    embedding_provider::EmbeddingRequest,
};
use crate::domain::repositories::{VectorCollection, vector_collection::CollectionMatch};

/// Number of passages handed to the language model for every question.
pub const RETRIEVAL_TOP_K: usize = 5;
pub const DEFAULT_MAX_ANSWER_TOKENS: u32 = 512;

const CONTEXT_SEPARATOR: &str = "\n\n";

#[derive(Debug)]
pub enum RetrievalError {
    EmbeddingError(String),
    CollectionError(String),
    MissingCredential(String),
    CompletionError(String),
}

impl std::fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            RetrievalError::CollectionError(msg) => write!(f, "Collection error: {}", msg),
            RetrievalError::MissingCredential(msg) => write!(f, "Credential error: {}", msg),
            RetrievalError::CompletionError(msg) => write!(f, "Completion error: {}", msg),
        }
    }
}

impl std::error::Error for RetrievalError {}

#[derive(Debug, Clone)]
pub struct GroundedAnswer {
    pub answer: String,
    pub context: String,
    pub matches: Vec<CollectionMatch>,
}

pub struct RetrievalService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    collection: Arc<dyn VectorCollection>,
    completion_provider: Arc<dyn CompletionProvider>,
    max_tokens: u32,
}

impl RetrievalService {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        collection: Arc<dyn VectorCollection>,
        completion_provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            embedding_provider,
            collection,
            completion_provider,
            max_tokens: DEFAULT_MAX_ANSWER_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<CollectionMatch>, RetrievalError> {
        let embedding_response = self
            .embedding_provider
            .generate_embedding(EmbeddingRequest::new(question))
            .await
            .map_err(|e| RetrievalError::EmbeddingError(e.to_string()))?;

        self.collection
            .query(&embedding_response.embedding, RETRIEVAL_TOP_K)
            .await
            .map_err(|e| RetrievalError::CollectionError(e.to_string()))
    }

    pub async fn answer(&self, question: &str) -> Result<GroundedAnswer, RetrievalError> {
        let matches = self.retrieve(question).await?;
        info!(
            "Retrieved {} of {} requested passages from '{}'",
            matches.len(),
            RETRIEVAL_TOP_K,
            self.collection.name()
        );
        for m in &matches {
            debug!(
                "Match {} (page {}, {}) scored {:.4}",
                m.id, m.metadata.page, m.metadata.chunk_type, m.similarity_score
            );
        }

        let context = build_context(&matches);
        let prompt = build_prompt(&context, question);
        debug!("Prompt is {} characters", prompt.chars().count());

        let completion = self
            .completion_provider
            .complete(CompletionRequest {
                prompt,
                max_tokens: self.max_tokens,
            })
            .await
            .map_err(|e| match e {
                CompletionProviderError::MissingCredential(_) => {
                    RetrievalError::MissingCredential(e.to_string())
                }
                _ => RetrievalError::CompletionError(e.to_string()),
            })?;
        debug!("Answer generated by {}", completion.model_name);

        Ok(GroundedAnswer {
            answer: completion.text.trim().to_string(),
            context,
            matches,
        })
    }
}

/// Formats matches in rank order as `(Page <page> - <type>): <content>`,
/// separated by blank lines. No matches yield an empty string.
pub fn build_context(matches: &[CollectionMatch]) -> String {
    matches
        .iter()
        .map(|m| {
            format!(
                "(Page {} - {}): {}",
                m.metadata.page, m.metadata.chunk_type, m.document
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question using ONLY the following context (from a PDF):\n{}\n\nQuestion: {}\nAnswer:",
        context, question
    )
}
