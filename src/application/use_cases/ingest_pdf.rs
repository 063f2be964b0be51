use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::application::ports::{DocumentExtractor, FileStorage};
use crate::application::services::{
    IndexingService, TextChunker, indexing_service::IndexingError,
};
use crate::domain::entities::Chunk;

const PDF_SUFFIX: &str = ".pdf";

#[derive(Debug)]
pub enum IngestPdfError {
    ValidationError(String),
    StorageError(String),
    ExtractionError(String),
    EmbeddingError(String),
    CollectionError(String),
}

impl std::fmt::Display for IngestPdfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestPdfError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            IngestPdfError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            IngestPdfError::ExtractionError(msg) => write!(f, "Extraction error: {}", msg),
            IngestPdfError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            IngestPdfError::CollectionError(msg) => write!(f, "Collection error: {}", msg),
        }
    }
}

impl std::error::Error for IngestPdfError {}

impl From<IndexingError> for IngestPdfError {
    fn from(error: IndexingError) -> Self {
        match error {
            IndexingError::EmbeddingError(msg) => IngestPdfError::EmbeddingError(msg),
            IndexingError::CollectionError(msg) => IngestPdfError::CollectionError(msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestPdfRequest {
    pub file_name: Option<String>,
    pub file_data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct IngestPdfResponse {
    pub chunks: usize,
    pub text_chunks: usize,
    pub table_chunks: usize,
    pub processing_time_ms: u64,
}

pub struct IngestPdfUseCase {
    document_extractor: Arc<dyn DocumentExtractor>,
    file_storage: Arc<dyn FileStorage>,
    text_chunker: TextChunker,
    indexing_service: Arc<IndexingService>,
}

impl IngestPdfUseCase {
    pub fn new(
        document_extractor: Arc<dyn DocumentExtractor>,
        file_storage: Arc<dyn FileStorage>,
        text_chunker: TextChunker,
        indexing_service: Arc<IndexingService>,
    ) -> Self {
        Self {
            document_extractor,
            file_storage,
            text_chunker,
            indexing_service,
        }
    }

    pub async fn execute(
        &self,
        request: IngestPdfRequest,
    ) -> Result<IngestPdfResponse, IngestPdfError> {
        let start_time = Instant::now();

        if request.file_data.is_empty() {
            return Err(IngestPdfError::ValidationError(
                "Uploaded file is empty".to_string(),
            ));
        }

        let file_name = request.file_name.as_deref().unwrap_or("<unnamed>");
        info!(
            "Ingesting '{}' ({} bytes)",
            file_name,
            request.file_data.len()
        );

        // The spooled file lives until the end of this function, on every path.
        let spooled = self
            .file_storage
            .spool(&request.file_data, PDF_SUFFIX)
            .await
            .map_err(|e| IngestPdfError::StorageError(e.to_string()))?;

        let (text_chunks, table_chunks) = self.extract(spooled.path()).await?;

        let chunked = self.text_chunker.chunk_text(&text_chunks);
        let text_count = chunked.len();
        let table_count = table_chunks.len();

        let mut all_chunks = chunked;
        all_chunks.extend(table_chunks);

        let indexed = self.indexing_service.index_chunks(&all_chunks).await?;

        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Indexed {} chunks from '{}' ({} text, {} table) in {} ms",
            indexed, file_name, text_count, table_count, processing_time_ms
        );

        Ok(IngestPdfResponse {
            chunks: indexed,
            text_chunks: text_count,
            table_chunks: table_count,
            processing_time_ms,
        })
    }

    async fn extract(&self, path: &Path) -> Result<(Vec<Chunk>, Vec<Chunk>), IngestPdfError> {
        let text_chunks = self
            .document_extractor
            .extract_text(path)
            .await
            .map_err(|e| IngestPdfError::ExtractionError(e.to_string()))?;

        let table_chunks = match self.document_extractor.extract_tables(path).await {
            Ok(tables) => tables,
            Err(e) => {
                warn!("Table extraction failed: {}", e);
                Vec::new()
            }
        };

        info!(
            "Extracted {} text pages and {} tables",
            text_chunks.len(),
            table_chunks.len()
        );

        Ok((text_chunks, table_chunks))
    }
}
