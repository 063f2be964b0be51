pub mod chunk;
pub mod indexed_entry;

pub use chunk::{Chunk, ChunkType};
pub use indexed_entry::{EntryMetadata, IndexedEntry};
