use async_trait::async_trait;

#[derive(Debug)]
pub enum CompletionProviderError {
    MissingCredential(String),
    NetworkError(String),
    ApiError(String),
    EmptyResponse,
}

impl std::fmt::Display for CompletionProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionProviderError::MissingCredential(var) => {
                write!(f, "Missing completion API credential: {} is not set", var)
            }
            CompletionProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            CompletionProviderError::ApiError(msg) => write!(f, "API error: {}", msg),
            CompletionProviderError::EmptyResponse => write!(f, "Completion returned no choices"),
        }
    }
}

impl std::error::Error for CompletionProviderError {}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub model_name: String,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionProviderError>;

    fn model_info(&self) -> String;
}
