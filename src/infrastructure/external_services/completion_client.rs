use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Error as ReqwestError};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::application::ports::completion_provider::{
    CompletionProvider, CompletionProviderError, CompletionRequest, CompletionResponse,
};
use crate::infrastructure::config::env_or;

pub const API_KEY_VARIABLE: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone)]
pub struct CompletionClientConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for CompletionClientConfig {
    fn default() -> Self {
        Self {
            api_url: env_or(
                "COMPLETION_API_URL",
                "https://api.openai.com/v1/completions".to_string(),
            ),
            api_key: env::var(API_KEY_VARIABLE)
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: env_or("COMPLETION_MODEL", "gpt-3.5-turbo-instruct".to_string()),
            timeout_secs: env_or("COMPLETION_TIMEOUT_SECS", 60),
        }
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionApiResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Client for an OpenAI-compatible text completion endpoint.
///
/// A missing API key is not an error at construction; every call fails with
/// `MissingCredential` instead.
#[derive(Debug, Clone)]
pub struct OpenAiCompletionProvider {
    client: Client,
    config: CompletionClientConfig,
}

impl OpenAiCompletionProvider {
    pub fn new(config: CompletionClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        Self::new(CompletionClientConfig::default())
    }

    pub fn has_credential(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletionProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionProviderError::MissingCredential(API_KEY_VARIABLE.to_string()))?;

        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| CompletionProviderError::MissingCredential(API_KEY_VARIABLE.to_string()))?;

        let body = CompletionBody {
            model: &self.config.model,
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionProviderError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(CompletionProviderError::ApiError(format!(
                "{} returned {}: {}",
                self.config.model, status, text
            )));
        }

        let parsed: CompletionApiResponse = response
            .json()
            .await
            .map_err(|e| CompletionProviderError::ApiError(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or(CompletionProviderError::EmptyResponse)?;

        Ok(CompletionResponse {
            text,
            model_name: self.config.model.clone(),
        })
    }

    fn model_info(&self) -> String {
        self.config.model.clone()
    }
}
