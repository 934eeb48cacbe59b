use std::time::Instant;

use super::types::*;
use crate::pipeline::extraction::{EngineFactory, ExtractionResult, Extractor};
use crate::pipeline::import::DocumentFile;

/// Progress callback, called with the completed percentage (0-100].
pub type ProgressFn<'a> = &'a (dyn Fn(f64) + Sync);

/// Drives the extractor over an ordered list of files.
///
/// Runs sequentially: the engine behind the extractor is a single instance
/// that must not see overlapping recognition calls.
pub struct BatchProcessor<F: EngineFactory> {
    extractor: Extractor<F>,
}

impl<F: EngineFactory> BatchProcessor<F> {
    pub fn new(extractor: Extractor<F>) -> Self {
        Self { extractor }
    }

    /// Extract every file, returning the successful results in input order.
    /// Failed files are logged and left out.
    pub async fn process_all(
        &self,
        files: &[DocumentFile],
        on_progress: Option<ProgressFn<'_>>,
    ) -> Vec<ExtractionResult> {
        self.process_all_detailed(files, on_progress)
            .await
            .into_results()
    }

    /// Like [`Self::process_all`], also reporting which files were skipped and why.
    pub async fn process_all_detailed(
        &self,
        files: &[DocumentFile],
        on_progress: Option<ProgressFn<'_>>,
    ) -> BatchReport {
        let start = Instant::now();
        let total = files.len();

        if total == 0 {
            return BatchReport::empty();
        }

        tracing::info!(total, "Starting extraction batch");
        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };

        for (index, file) in files.iter().enumerate() {
            match self.extractor.extract(file).await {
                Ok(result) => report.items.push(BatchItem {
                    index,
                    file_name: file.name.clone(),
                    result,
                }),
                Err(e) => {
                    tracing::warn!(
                        file = %file.name,
                        index,
                        error = %e,
                        "Extraction failed, skipping file"
                    );
                    report.failures.push(BatchFailure {
                        index,
                        file_name: file.name.clone(),
                        message: e.message(),
                    });
                }
            }

            if let Some(progress) = on_progress {
                progress(progress_percent(index + 1, total));
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            total,
            succeeded = report.succeeded(),
            failed = report.failures.len(),
            duration_ms = report.duration_ms,
            "Extraction batch finished"
        );
        report
    }
}
