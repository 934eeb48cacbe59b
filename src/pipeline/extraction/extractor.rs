use std::sync::Arc;

use super::engine::EngineManager;
use super::types::{EngineFactory, ExtractionResult, OcrEngine};
use super::{IngestError, PDF_UNSUPPORTED_MESSAGE};
use crate::pipeline::import::{DocumentFile, FileCategory};

/// Runs OCR on a single document through the shared engine.
pub struct Extractor<F: EngineFactory> {
    engines: Arc<EngineManager<F>>,
}

impl<F: EngineFactory> Clone for Extractor<F> {
    fn clone(&self) -> Self {
        Self {
            engines: Arc::clone(&self.engines),
        }
    }
}

impl<F: EngineFactory> Extractor<F> {
    pub fn new(engines: Arc<EngineManager<F>>) -> Self {
        Self { engines }
    }

    pub fn engines(&self) -> &Arc<EngineManager<F>> {
        &self.engines
    }

    /// Extract text, overall confidence and word boxes from an image file.
    ///
    /// PDFs fail with [`IngestError::Unsupported`]. Every other failure,
    /// including engine startup, surfaces as [`IngestError::Extraction`]
    /// carrying the underlying message.
    pub async fn extract(&self, file: &DocumentFile) -> Result<ExtractionResult, IngestError> {
        let format = file.format();
        if format.category == FileCategory::Pdf {
            return self.extract_pdf(file);
        }

        match self.recognize(file).await {
            Ok(result) => {
                tracing::debug!(
                    file = %file.name,
                    mime_type = %format.mime_type,
                    size_bytes = file.size_bytes(),
                    confidence = result.confidence,
                    words = result.words.len(),
                    "Extracted text"
                );
                Ok(result)
            }
            Err(message) => Err(IngestError::Extraction { message }),
        }
    }

    /// PDF text extraction is delegated to server-side processing.
    pub fn extract_pdf(&self, file: &DocumentFile) -> Result<ExtractionResult, IngestError> {
        tracing::debug!(file = %file.name, "Rejecting PDF for local extraction");
        Err(IngestError::Unsupported(PDF_UNSUPPORTED_MESSAGE.to_string()))
    }

    async fn recognize(&self, file: &DocumentFile) -> Result<ExtractionResult, String> {
        if file.bytes.is_empty() {
            return Err("File is empty".to_string());
        }

        let engine = self.engines.ensure_engine().await.map_err(|e| e.message())?;
        let raw = engine
            .recognize(&file.bytes)
            .await
            .map_err(|e| e.to_string())?;

        Ok(ExtractionResult::from(raw))
    }
}
