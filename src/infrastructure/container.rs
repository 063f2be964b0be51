use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    application::{
        ports::{CompletionProvider, DocumentExtractor, EmbeddingProvider, FileStorage},
        services::{IndexingService, RetrievalService, TextChunker},
        use_cases::{AskQuestionUseCase, CollectionStatsUseCase, IngestPdfUseCase},
    },
    domain::repositories::VectorCollection,
    infrastructure::{
        config::AppConfig,
        external_services::{
            InferenceEmbeddingProvider, OpenAiCompletionProvider,
            document_extractors::PdfExtractor,
        },
        file_system::TempFileStorage,
        vector_store::InMemoryCollection,
    },
    presentation::http::{
        HttpServer,
        handlers::{AskHandler, CollectionHandler, IngestHandler},
    },
};

pub struct AppContainer {
    pub config: AppConfig,
    pub collection: Arc<dyn VectorCollection>,

    // HTTP Handlers
    pub ingest_handler: Arc<IngestHandler>,
    pub ask_handler: Arc<AskHandler>,
    pub collection_handler: Arc<CollectionHandler>,
}

impl AppContainer {
    pub fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let embedding_client = InferenceEmbeddingProvider::from_env()
            .map_err(|e| format!("Failed to create embedding client: {}", e))?;
        let completion_client = OpenAiCompletionProvider::from_env()
            .map_err(|e| format!("Failed to create completion client: {}", e))?;

        if !completion_client.has_credential() {
            warn!("OPENAI_API_KEY is not set; /ask/ will fail until it is provided");
        }

        info!(
            "Embedding model: {}; completion model: {}; collection: {}; chunk length: {}; answer tokens: {}",
            embedding_client.model_info(),
            completion_client.model_info(),
            config.pipeline.collection_name,
            config.pipeline.chunk_max_length,
            config.pipeline.max_answer_tokens
        );

        let collection: Arc<dyn VectorCollection> =
            Arc::new(InMemoryCollection::new(config.pipeline.collection_name.clone()));

        Ok(Self::from_parts(
            config,
            Arc::new(PdfExtractor::new()),
            Arc::new(embedding_client),
            Arc::new(completion_client),
            collection,
        ))
    }

    /// Wires services, use cases and handlers around the given adapters.
    pub fn from_parts(
        config: AppConfig,
        document_extractor: Arc<dyn DocumentExtractor>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        completion_provider: Arc<dyn CompletionProvider>,
        collection: Arc<dyn VectorCollection>,
    ) -> Self {
        let file_storage: Arc<dyn FileStorage> =
            Arc::new(TempFileStorage::new(config.pipeline.upload_dir.clone()));

        // Create application services
        let indexing_service = Arc::new(IndexingService::new(
            embedding_provider.clone(),
            collection.clone(),
        ));
        let retrieval_service = Arc::new(
            RetrievalService::new(
                embedding_provider,
                collection.clone(),
                completion_provider,
            )
            .with_max_tokens(config.pipeline.max_answer_tokens),
        );

        // Create use cases
        let ingest_pdf_use_case = Arc::new(IngestPdfUseCase::new(
            document_extractor,
            file_storage,
            TextChunker::new(config.pipeline.chunk_max_length),
            indexing_service,
        ));
        let ask_question_use_case = Arc::new(AskQuestionUseCase::new(retrieval_service));
        let collection_stats_use_case =
            Arc::new(CollectionStatsUseCase::new(collection.clone()));

        // Create HTTP handlers
        let ingest_handler = Arc::new(IngestHandler::new(ingest_pdf_use_case));
        let ask_handler = Arc::new(AskHandler::new(ask_question_use_case));
        let collection_handler =
            Arc::new(CollectionHandler::new(collection_stats_use_case));

        Self {
            config,
            collection,
            ingest_handler,
            ask_handler,
            collection_handler,
        }
    }

    pub fn http_server(&self) -> HttpServer {
        HttpServer::new(
            self.ingest_handler.clone(),
            self.ask_handler.clone(),
            self.collection_handler.clone(),
            self.config.server.clone(),
        )
    }
}
