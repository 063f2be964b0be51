pub mod ask_handler;
pub mod collection_handler;
pub mod ingest_handler;

pub use ask_handler::AskHandler;
pub use collection_handler::CollectionHandler;
pub use ingest_handler::IngestHandler;
