use serde::{Deserialize, Serialize};

use crate::application::use_cases::{
    ask_question::AskQuestionResponse, collection_stats::CollectionStatsResponse,
    ingest_pdf::IngestPdfResponse,
};

const PROCESSED: &str = "processed";

#[derive(Debug, Serialize)]
pub struct UploadPdfResponseDto {
    pub status: String,
    pub chunks: usize,
}

impl From<IngestPdfResponse> for UploadPdfResponseDto {
    fn from(response: IngestPdfResponse) -> Self {
        Self {
            status: PROCESSED.to_string(),
            chunks: response.chunks,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AskRequestDto {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponseDto {
    pub answer: String,
    pub context: String,
}

impl From<AskQuestionResponse> for AskResponseDto {
    fn from(response: AskQuestionResponse) -> Self {
        Self {
            answer: response.answer,
            context: response.context,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollectionStatsDto {
    pub name: String,
    pub entries: usize,
}

impl From<CollectionStatsResponse> for CollectionStatsDto {
    fn from(response: CollectionStatsResponse) -> Self {
        Self {
            name: response.name,
            entries: response.entries,
        }
    }
}
