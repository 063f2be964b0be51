pub mod completion_client;
pub mod document_extractors;
pub mod inference_client;

pub use completion_client::OpenAiCompletionProvider;
pub use inference_client::InferenceEmbeddingProvider;
