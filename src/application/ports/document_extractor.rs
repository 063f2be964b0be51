use async_trait::async_trait;
use std::path::Path;

use crate::domain::entities::Chunk;

#[derive(Debug)]
pub enum DocumentExtractionError {
    CorruptedFile(String),
    ExtractionFailed(String),
    IoError(String),
}

impl std::fmt::Display for DocumentExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentExtractionError::CorruptedFile(msg) => write!(f, "Corrupted file: {}", msg),
            DocumentExtractionError::ExtractionFailed(msg) => write!(f, "Extraction failed: {}", msg),
            DocumentExtractionError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for DocumentExtractionError {}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// One `text` chunk per page with non-blank text, `page` being 1-based.
    /// Pages without extractable text are omitted.
    async fn extract_text(&self, file_path: &Path) -> Result<Vec<Chunk>, DocumentExtractionError>;

    /// One `table` chunk per detected table, content serialized as CSV with
    /// the header row first.
    async fn extract_tables(&self, file_path: &Path)
    -> Result<Vec<Chunk>, DocumentExtractionError>;
}
