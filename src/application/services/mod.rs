pub mod indexing_service;
pub mod retrieval_service;
pub mod text_chunker;

pub use indexing_service::IndexingService;
pub use retrieval_service::RetrievalService;
pub use text_chunker::TextChunker;
