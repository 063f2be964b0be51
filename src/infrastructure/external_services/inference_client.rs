use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, Error as ReqwestError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::embedding_provider::{
    EmbeddingProvider, EmbeddingProviderError, EmbeddingRequest, EmbeddingResponse,
};
use crate::infrastructure::config::env_or;

#[derive(Serialize)]
pub struct EmbeddingsRequest<'a> {
    pub text: &'a str,
    pub model: &'a str,
}

#[derive(Deserialize)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vector>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsClientConfig {
    pub service_url: String,
    pub model_name: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingsClientConfig {
    fn default() -> Self {
        Self {
            service_url: env_or(
                "EMBEDDINGS_SERVICE_URL",
                "http://localhost:8080/embed".to_string(),
            ),
            model_name: env_or("EMBEDDING_MODEL", "all-MiniLM-L6-v2".to_string()),
            timeout_secs: env_or("EMBEDDINGS_TIMEOUT_SECS", 30),
        }
    }
}

#[derive(Debug)]
pub enum EmbeddingsError {
    RequestError(String),
    StatusError(u16, String),
    ParseError(String),
}

impl std::fmt::Display for EmbeddingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingsError::RequestError(msg) => write!(f, "Request failed: {}", msg),
            EmbeddingsError::StatusError(status, body) => {
                write!(f, "Embedding service returned {}: {}", status, body)
            }
            EmbeddingsError::ParseError(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

/// HTTP client for a sentence-embedding service that accepts
/// `{"text": ..., "model": ...}` and answers `{"embeddings": [[...]]}`.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    config: EmbeddingsClientConfig,
}

impl InferenceClient {
    pub fn new(config: EmbeddingsClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        Self::new(EmbeddingsClientConfig::default())
    }

    pub fn config(&self) -> &EmbeddingsClientConfig {
        &self.config
    }

    pub async fn get_embedding(
        &self,
        text: &str,
        model: &str,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let request = EmbeddingsRequest { text, model };

        self.execute_request(&request).await
    }

    async fn execute_request(
        &self,
        request: &EmbeddingsRequest<'_>,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let response = self
            .client
            .post(&self.config.service_url)
            .json(request)
            .send()
            .await
            .map_err(|e| EmbeddingsError::RequestError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingsError::StatusError(status.as_u16(), body));
        }

        response
            .json::<EmbeddingsResponse>()
            .await
            .map_err(|e| EmbeddingsError::ParseError(e.to_string()))
    }
}

// Adapter to implement the EmbeddingProvider trait
pub struct InferenceEmbeddingProvider {
    client: InferenceClient,
}

impl InferenceEmbeddingProvider {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        let client = InferenceClient::from_env()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EmbeddingProvider for InferenceEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        let model_name = request
            .model_name
            .unwrap_or_else(|| self.client.config().model_name.clone());

        let response = self
            .client
            .get_embedding(&request.text, &model_name)
            .await
            .map_err(|e| match e {
                EmbeddingsError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
                EmbeddingsError::StatusError(503, _) => EmbeddingProviderError::ServiceUnavailable,
                EmbeddingsError::StatusError(status, body) if (400..500).contains(&status) => {
                    EmbeddingProviderError::InvalidInput(format!("{}: {}", status, body))
                }
                other => EmbeddingProviderError::ApiError(other.to_string()),
            })?;

        let embedding = response.embeddings.into_iter().next().ok_or_else(|| {
            EmbeddingProviderError::ApiError("No embeddings returned".to_string())
        })?;

        if embedding.as_slice().is_empty() {
            return Err(EmbeddingProviderError::ApiError(
                "Embedding service returned an empty vector".to_string(),
            ));
        }

        Ok(EmbeddingResponse {
            embedding,
            model_name,
        })
    }

    fn model_info(&self) -> String {
        self.client.config().model_name.clone()
    }
}
