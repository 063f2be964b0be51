use std::sync::Arc;
use tracing::debug;

use crate::application::ports::{EmbeddingProvider, embedding_provider::EmbeddingRequest};
use crate::domain::entities::{Chunk, IndexedEntry};
use crate::domain::repositories::VectorCollection;

#[derive(Debug)]
pub enum IndexingError {
    EmbeddingError(String),
    CollectionError(String),
}

impl std::fmt::Display for IndexingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexingError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            IndexingError::CollectionError(msg) => write!(f, "Collection error: {}", msg),
        }
    }
}

impl std::error::Error for IndexingError {}

pub struct IndexingService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    collection: Arc<dyn VectorCollection>,
}

impl IndexingService {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        collection: Arc<dyn VectorCollection>,
    ) -> Self {
        Self {
            embedding_provider,
            collection,
        }
    }

    /// Embeds and inserts chunks one at a time. A failure stops the loop but
    /// leaves already inserted entries in place.
    pub async fn index_chunks(&self, chunks: &[Chunk]) -> Result<usize, IndexingError> {
        let mut indexed = 0;

        for chunk in chunks {
            self.index_chunk(chunk).await?;
            indexed += 1;
        }

        Ok(indexed)
    }

    pub async fn index_chunk(&self, chunk: &Chunk) -> Result<IndexedEntry, IndexingError> {
        let response = self
            .embedding_provider
            .generate_embedding(EmbeddingRequest::new(chunk.content()))
            .await
            .map_err(|e| IndexingError::EmbeddingError(e.to_string()))?;

        let entry = IndexedEntry::new(chunk, response.embedding);

        debug!(
            "Indexing {} chunk from page {} as {} ({} dims via {}) at {}",
            chunk.chunk_type(),
            chunk.page(),
            entry.id(),
            entry.dimension(),
            response.model_name,
            entry.indexed_at().to_rfc3339()
        );

        self.collection
            .add(entry.clone())
            .await
            .map_err(|e| IndexingError::CollectionError(e.to_string()))?;

        Ok(entry)
    }
}
