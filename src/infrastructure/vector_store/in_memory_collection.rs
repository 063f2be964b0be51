use async_trait::async_trait;
use pgvector::Vector;
use tokio::sync::RwLock;

use crate::domain::entities::IndexedEntry;
use crate::domain::repositories::{
    VectorCollection,
    vector_collection::{CollectionError, CollectionMatch},
};

/// Process-local collection with exhaustive cosine-similarity search.
///
/// The first inserted vector fixes the dimension; later inserts and queries
/// with a different length are rejected. Equal scores keep insertion order.
pub struct InMemoryCollection {
    name: String,
    entries: RwLock<Vec<IndexedEntry>>,
}

impl InMemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(Vec::new()),
        }
    }

    #[cfg(test)]
    pub async fn entries(&self) -> Vec<IndexedEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl VectorCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, entry: IndexedEntry) -> Result<(), CollectionError> {
        let mut entries = self.entries.write().await;

        if let Some(first) = entries.first() {
            if first.dimension() != entry.dimension() {
                return Err(CollectionError::DimensionMismatch {
                    expected: first.dimension(),
                    actual: entry.dimension(),
                });
            }
        }

        entries.push(entry);
        Ok(())
    }

    async fn query(
        &self,
        query_vector: &Vector,
        n_results: usize,
    ) -> Result<Vec<CollectionMatch>, CollectionError> {
        let entries = self.entries.read().await;

        if let Some(first) = entries.first() {
            let actual = query_vector.as_slice().len();
            if first.dimension() != actual {
                return Err(CollectionError::DimensionMismatch {
                    expected: first.dimension(),
                    actual,
                });
            }
        }

        let mut scored: Vec<(f32, &IndexedEntry)> = entries
            .iter()
            .map(|entry| {
                (
                    calculate_cosine_similarity(query_vector, entry.embedding()),
                    entry,
                )
            })
            .collect();

        // Stable sort, so ties stay in insertion order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(n_results)
            .map(|(similarity_score, entry)| CollectionMatch {
                id: entry.id(),
                document: entry.document().to_string(),
                metadata: entry.metadata().clone(),
                similarity_score,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, CollectionError> {
        Ok(self.entries.read().await.len())
    }
}

fn calculate_cosine_similarity(a: &Vector, b: &Vector) -> f32 {
    let a_slice = a.as_slice();
    let b_slice = b.as_slice();

    if a_slice.len() != b_slice.len() {
        return 0.0;
    }

    let dot_product: f32 = a_slice.iter().zip(b_slice.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a_slice.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b_slice.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot_product / (norm_a * norm_b);
    if similarity.is_finite() { similarity } else { 0.0 }
}
