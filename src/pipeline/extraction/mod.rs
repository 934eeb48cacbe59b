pub mod types;
pub mod engine;
pub mod ocr;
pub mod mock;
pub mod extractor;

pub use types::*;
pub use engine::*;
#[cfg(feature = "ocr")]
pub use ocr::*;
pub use mock::*;
pub use extractor::*;

use thiserror::Error;

/// Fixed message returned for any PDF extraction request.
pub const PDF_UNSUPPORTED_MESSAGE: &str =
    "PDF text extraction is not supported here; submit the PDF for server-side processing";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR engine initialization failed: {0}")]
    EngineInitialization(String),

    #[error("OCR failed: {message}")]
    Extraction { message: String },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl IngestError {
    /// Message carried by the error, without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Io(e) => e.to_string(),
            Self::EngineInitialization(m) | Self::Unsupported(m) => m.clone(),
            Self::Extraction { message } => message.clone(),
        }
    }
}
