use std::sync::Arc;

use crate::domain::repositories::{VectorCollection, vector_collection::CollectionError};

#[derive(Debug, Clone)]
pub struct CollectionStatsResponse {
    pub name: String,
    pub entries: usize,
}

pub struct CollectionStatsUseCase {
    collection: Arc<dyn VectorCollection>,
}

impl CollectionStatsUseCase {
    pub fn new(collection: Arc<dyn VectorCollection>) -> Self {
        Self { collection }
    }

    pub async fn execute(&self) -> Result<CollectionStatsResponse, CollectionError> {
        Ok(CollectionStatsResponse {
            name: self.collection.name().to_string(),
            entries: self.collection.count().await?,
        })
    }
}
