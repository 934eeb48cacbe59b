use serde::Serialize;

use crate::pipeline::extraction::ExtractionResult;

/// A file that extracted successfully, with its position in the input.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub index: usize,
    pub file_name: String,
    pub result: ExtractionResult,
}

/// A file that was skipped because extraction failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub index: usize,
    pub file_name: String,
    pub message: String,
}

/// Outcome of a batch run. `items` and `failures` are each in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub items: Vec<BatchItem>,
    pub failures: Vec<BatchFailure>,
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn succeeded(&self) -> usize {
        self.items.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Successful extraction results, in input order.
    pub fn into_results(self) -> Vec<ExtractionResult> {
        self.items.into_iter().map(|item| item.result).collect()
    }
}

/// Percentage of the batch finished after `completed` of `total` files.
pub fn progress_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    completed as f64 / total as f64 * 100.0
}
