use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::chunk::{Chunk, ChunkType};

/// Metadata stored next to every vector. The content is duplicated here so
/// retrieval can display it without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    pub page: u32,
    pub content: String,
}

impl From<&Chunk> for EntryMetadata {
    fn from(chunk: &Chunk) -> Self {
        Self {
            chunk_type: chunk.chunk_type(),
            page: chunk.page(),
            content: chunk.content().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedEntry {
    id: Uuid,
    embedding: Vector,
    metadata: EntryMetadata,
    indexed_at: DateTime<Utc>,
}

impl IndexedEntry {
    /// Every call mints a fresh id, so indexing the same chunk twice yields
    /// two entries.
    pub fn new(chunk: &Chunk, embedding: Vector) -> Self {
        Self {
            id: Uuid::new_v4(),
            embedding,
            metadata: EntryMetadata::from(chunk),
            indexed_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn embedding(&self) -> &Vector {
        &self.embedding
    }

    pub fn metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    pub fn document(&self) -> &str {
        &self.metadata.content
    }

    pub fn indexed_at(&self) -> DateTime<Utc> {
        self.indexed_at
    }

    pub fn dimension(&self) -> usize {
        self.embedding.as_slice().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_copies_chunk_into_metadata() {
        let chunk = Chunk::text(1, "Hello world. This is a test.");
        let entry = IndexedEntry::new(&chunk, Vector::from(vec![0.1, 0.2, 0.3]));

        assert_eq!(entry.metadata().chunk_type, ChunkType::Text);
        assert_eq!(entry.metadata().page, 1);
        assert_eq!(entry.document(), "Hello world. This is a test.");
        assert_eq!(entry.dimension(), 3);
    }

    #[test]
    fn test_ids_are_unique_per_insertion() {
        let chunk = Chunk::table(4, "h1,h2\nv1,v2\n");
        let first = IndexedEntry::new(&chunk, Vector::from(vec![1.0]));
        let second = IndexedEntry::new(&chunk, Vector::from(vec![1.0]));

        assert_ne!(first.id(), second.id());
        assert_eq!(first.metadata(), second.metadata());
    }
}
