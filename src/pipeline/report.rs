//! Payload handed to the report-submission API once a file is extracted.

use serde::Serialize;

use super::batch::{BatchItem, BatchReport};
use super::extraction::ExtractionResult;
use super::structuring::{classify_document, summary_context};
use crate::models::enums::DocumentType;

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedReport {
    pub file_name: String,
    pub document_type: DocumentType,
    pub summary_context: &'static str,
    pub extraction: ExtractionResult,
}

impl ProcessedReport {
    pub fn new(file_name: impl Into<String>, extraction: ExtractionResult) -> Self {
        let document_type = classify_document(&extraction.text);
        Self {
            file_name: file_name.into(),
            document_type,
            summary_context: summary_context(document_type),
            extraction,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<BatchItem> for ProcessedReport {
    fn from(item: BatchItem) -> Self {
        Self::new(item.file_name, item.result)
    }
}

/// Classify every successful item of a batch, keeping input order.
pub fn reports_from_batch(batch: BatchReport) -> Vec<ProcessedReport> {
    batch.items.into_iter().map(ProcessedReport::from).collect()
}
