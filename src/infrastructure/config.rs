use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::application::services::retrieval_service::DEFAULT_MAX_ANSWER_TOKENS;
use crate::application::services::text_chunker::DEFAULT_MAX_CHUNK_LENGTH;

pub const DEFAULT_COLLECTION_NAME: &str = "pdf_chunks";

/// Reads `key` from the environment, falling back to `default` when it is
/// unset or does not parse.
pub fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring {}={:?} ({}); using {}", key, raw, e, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 8000),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 25 * 1024 * 1024),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub chunk_max_length: usize,
    pub collection_name: String,
    pub max_answer_tokens: u32,
    pub upload_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_max_length: env_or("CHUNK_MAX_LENGTH", DEFAULT_MAX_CHUNK_LENGTH),
            collection_name: env_or("COLLECTION_NAME", DEFAULT_COLLECTION_NAME.to_string()),
            max_answer_tokens: env_or("COMPLETION_MAX_TOKENS", DEFAULT_MAX_ANSWER_TOKENS),
            upload_dir: env::var("UPLOAD_DIR").ok().map(PathBuf::from),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::default()
    }
}
