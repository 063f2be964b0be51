use async_trait::async_trait;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::{EntryMetadata, IndexedEntry};

#[derive(Debug)]
pub enum CollectionError {
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionError::DimensionMismatch { expected, actual } => write!(
                f,
                "Embedding dimension mismatch: collection holds {} but got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for CollectionError {}

#[derive(Debug, Clone)]
pub struct CollectionMatch {
    pub id: Uuid,
    pub document: String,
    pub metadata: EntryMetadata,
    pub similarity_score: f32,
}

/// Append-only vector index shared by every upload for the lifetime of the
/// process. Entries are never updated or removed.
#[async_trait]
pub trait VectorCollection: Send + Sync {
    fn name(&self) -> &str;

    async fn add(&self, entry: IndexedEntry) -> Result<(), CollectionError>;

    /// Nearest neighbours of `query_vector`, closest first. Returns fewer
    /// than `n_results` matches when the collection holds fewer entries.
    async fn query(
        &self,
        query_vector: &Vector,
        n_results: usize,
    ) -> Result<Vec<CollectionMatch>, CollectionError>;

    async fn count(&self) -> Result<usize, CollectionError>;
}
