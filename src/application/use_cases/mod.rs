pub mod ask_question;
pub mod collection_stats;
pub mod ingest_pdf;

pub use ask_question::AskQuestionUseCase;
pub use collection_stats::CollectionStatsUseCase;
pub use ingest_pdf::IngestPdfUseCase;
