//! Port fakes and PDF builders shared by the unit tests.

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use pgvector::Vector;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::ports::completion_provider::{
    CompletionProvider, CompletionProviderError, CompletionRequest, CompletionResponse,
};
use crate::application::ports::document_extractor::{DocumentExtractionError, DocumentExtractor};
use crate::application::ports::embedding_provider::{
    EmbeddingProvider, EmbeddingProviderError, EmbeddingRequest, EmbeddingResponse,
};
use crate::domain::entities::Chunk;

const HASHING_DIMENSION: usize = 64;

/// Bag-of-words embedding: each lowercase alphanumeric token bumps one of
/// 64 buckets chosen by FNV-1a.
#[derive(Default)]
pub struct HashingEmbeddingProvider;

impl HashingEmbeddingProvider {
    pub fn embed(&self, text: &str) -> Vector {
        let mut buckets = vec![0.0f32; HASHING_DIMENSION];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.to_lowercase().bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x100000001b3);
            }
            buckets[(hash % HASHING_DIMENSION as u64) as usize] += 1.0;
        }

        Vector::from(buckets)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        Ok(EmbeddingResponse {
            embedding: self.embed(&request.text),
            model_name: self.model_info(),
        })
    }

    fn model_info(&self) -> String {
        "hashing-64".to_string()
    }
}

/// Succeeds for the first `successes` calls, then reports the service down.
pub struct FailingEmbeddingProvider {
    successes: usize,
    calls: AtomicUsize,
    inner: HashingEmbeddingProvider,
}

impl FailingEmbeddingProvider {
    pub fn after(successes: usize) -> Self {
        Self {
            successes,
            calls: AtomicUsize::new(0),
            inner: HashingEmbeddingProvider,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.successes {
            return Err(EmbeddingProviderError::ServiceUnavailable);
        }
        self.inner.generate_embedding(request).await
    }

    fn model_info(&self) -> String {
        "failing".to_string()
    }
}

pub struct RecordingCompletionProvider {
    reply: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingCompletionProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for RecordingCompletionProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionProviderError> {
        self.requests.lock().unwrap().push(request);
        Ok(CompletionResponse {
            text: self.reply.clone(),
            model_name: self.model_info(),
        })
    }

    fn model_info(&self) -> String {
        "recording".to_string()
    }
}

pub struct MissingKeyCompletionProvider;

#[async_trait]
impl CompletionProvider for MissingKeyCompletionProvider {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionProviderError> {
        Err(CompletionProviderError::MissingCredential(
            "OPENAI_API_KEY".to_string(),
        ))
    }

    fn model_info(&self) -> String {
        "unconfigured".to_string()
    }
}

/// Returns canned chunks and records which paths it was asked to read.
#[derive(Default)]
pub struct StubExtractor {
    text: Vec<Chunk>,
    tables: Vec<Chunk>,
    corrupted: bool,
    failing_tables: bool,
    seen_paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl StubExtractor {
    pub fn with_text(text: Vec<Chunk>) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    pub fn corrupted() -> Self {
        Self {
            corrupted: true,
            ..Self::default()
        }
    }

    pub fn tables(mut self, tables: Vec<Chunk>) -> Self {
        self.tables = tables;
        self
    }

    pub fn failing_tables(mut self) -> Self {
        self.failing_tables = true;
        self
    }

    pub fn seen_paths(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        self.seen_paths.clone()
    }

    fn record(&self, path: &Path) -> Result<(), DocumentExtractionError> {
        if !path.is_file() {
            return Err(DocumentExtractionError::IoError(format!(
                "{} does not exist",
                path.display()
            )));
        }
        self.seen_paths.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

#[async_trait]
impl DocumentExtractor for StubExtractor {
    async fn extract_text(&self, file_path: &Path) -> Result<Vec<Chunk>, DocumentExtractionError> {
        self.record(file_path)?;
        if self.corrupted {
            return Err(DocumentExtractionError::CorruptedFile(
                "invalid file header".to_string(),
            ));
        }
        Ok(self.text.clone())
    }

    async fn extract_tables(
        &self,
        file_path: &Path,
    ) -> Result<Vec<Chunk>, DocumentExtractionError> {
        self.record(file_path)?;
        if self.failing_tables {
            return Err(DocumentExtractionError::ExtractionFailed(
                "no usable content stream".to_string(),
            ));
        }
        Ok(self.tables.clone())
    }
}

/// One line of Courier text per entry, top of the page downwards.
pub fn text_page_operations(lines: &[&str]) -> Vec<Operation> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    operations
}

/// Each cell is its own text object, placed on a 150pt column grid.
pub fn table_page_operations(rows: &[&[&str]]) -> Vec<Operation> {
    let mut operations = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        for (column_index, cell) in row.iter().enumerate() {
            let x = 72 + 150 * column_index as i64;
            let y = 700 - 20 * row_index as i64;
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![x.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(*cell)]),
                Operation::new("ET", vec![]),
            ]);
        }
    }
    operations
}

pub fn pdf_document(pages: Vec<Vec<Operation>>) -> Document {
    pdf_document_with_font(
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        },
        pages,
    )
}

/// Builds a document whose pages all share `font` as `/F1`.
pub fn pdf_document_with_font(font: Dictionary, pages: Vec<Vec<Operation>>) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(font);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn pdf_bytes(pages: Vec<Vec<Operation>>) -> Vec<u8> {
    let mut bytes = Vec::new();
    pdf_document(pages).save_to(&mut bytes).unwrap();
    bytes
}
