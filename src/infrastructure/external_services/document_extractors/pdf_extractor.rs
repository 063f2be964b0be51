use async_trait::async_trait;
use lopdf::{Document, Object};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::table_detection::extract_document_tables;
use crate::application::ports::document_extractor::{DocumentExtractionError, DocumentExtractor};
use crate::domain::entities::Chunk;

pub struct PdfExtractor {
    password: String,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            password: String::new(),
        }
    }

    fn filter_func(object_id: (u32, u16), object: &mut Object) -> Option<((u32, u16), Object)> {
        static IGNORE: &[&[u8]] = &[
            b"Length",
            b"BBox",
            b"Matrix",
            b"Filter",
            b"ColorSpace",
            b"Width",
            b"Height",
            b"BitsPerComponent",
            b"PTEX.FileName",
            b"PTEX.PageNumber",
            b"PTEX.InfoDict",
            b"FontDescriptor",
            b"ExtGState",
            b"MediaBox",
        ];

        if let Object::Dictionary(dict) = object {
            let keys_to_remove: Vec<_> = dict
                .iter()
                .filter(|(key, _)| IGNORE.contains(&key.as_slice()))
                .map(|(key, _)| key.clone())
                .collect();
            for key in keys_to_remove {
                dict.remove(&key);
            }
        }

        Some((object_id, object.to_owned()))
    }

    fn load_document(path: &Path, password: &str) -> Result<Document, DocumentExtractionError> {
        if !path.is_file() {
            return Err(DocumentExtractionError::IoError(format!(
                "{} is not a readable file",
                path.display()
            )));
        }

        let mut doc = Document::load_filtered(path, Self::filter_func)
            .map_err(|e| DocumentExtractionError::CorruptedFile(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt(password).map_err(|_| {
                DocumentExtractionError::ExtractionFailed(
                    "Failed to decrypt PDF - invalid password".to_string(),
                )
            })?;
        }

        Ok(doc)
    }

    /// Trimmed text of every page that has any, keyed by 1-based page number.
    fn extract_pages(doc: &Document) -> Vec<Chunk> {
        let pages: Vec<u32> = doc.get_pages().into_keys().collect();

        let extracted: Vec<Option<Chunk>> = pages
            .into_par_iter()
            .map(|page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => {
                    let text = text.trim();
                    (!text.is_empty()).then(|| Chunk::text(page_number, text))
                }
                Err(e) => {
                    warn!("Failed to extract text from page {}: {}", page_number, e);
                    None
                }
            })
            .collect();

        extracted.into_iter().flatten().collect()
    }

    async fn run_blocking<T, F>(&self, path: &Path, job: F) -> Result<T, DocumentExtractionError>
    where
        T: Send + 'static,
        F: FnOnce(&Document) -> Result<T, DocumentExtractionError> + Send + 'static,
    {
        let path: PathBuf = path.to_path_buf();
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || {
            let doc = Self::load_document(&path, &password)?;
            job(&doc)
        })
        .await
        .map_err(|e| DocumentExtractionError::ExtractionFailed(format!("Extraction task failed: {}", e)))?
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract_text(&self, file_path: &Path) -> Result<Vec<Chunk>, DocumentExtractionError> {
        let chunks = self
            .run_blocking(file_path, |doc| Ok(Self::extract_pages(doc)))
            .await?;
        debug!("{} pages with text in {}", chunks.len(), file_path.display());
        Ok(chunks)
    }

    async fn extract_tables(
        &self,
        file_path: &Path,
    ) -> Result<Vec<Chunk>, DocumentExtractionError> {
        let tables = self.run_blocking(file_path, extract_document_tables).await?;
        debug!("{} tables in {}", tables.len(), file_path.display());
        Ok(tables)
    }
}
