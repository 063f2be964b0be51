use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Text,
    Table,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Text => "text",
            ChunkType::Table => "table",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrievable unit of document content: prose from one page, or one
/// table serialized as CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "type")]
    chunk_type: ChunkType,
    page: u32,
    content: String,
}

impl Chunk {
    pub fn new(chunk_type: ChunkType, page: u32, content: String) -> Self {
        Self {
            chunk_type,
            page,
            content,
        }
    }

    pub fn text(page: u32, content: impl Into<String>) -> Self {
        Self::new(ChunkType::Text, page, content.into())
    }

    pub fn table(page: u32, content: impl Into<String>) -> Self {
        Self::new(ChunkType::Table, page, content.into())
    }

    // Getters
    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// New chunk with the same origin (type and page) but different content.
    pub fn derive(&self, content: String) -> Self {
        Self::new(self.chunk_type, self.page, content)
    }
}
