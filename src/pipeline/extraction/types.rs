use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of text extraction from a single document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    /// Overall confidence, 0-100.
    pub confidence: f32,
    pub words: Vec<OcrWord>,
}

/// Single recognized word with its own confidence and pixel bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Word bounds in image pixels (top-left / bottom-right corners)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl BoundingBox {
    pub fn from_rect(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            x0: left,
            y0: top,
            x1: left.saturating_add(width),
            y1: top.saturating_add(height),
        }
    }
}

/// Raw output of an engine's recognize call
#[derive(Debug, Clone, Default)]
pub struct RawRecognition {
    pub text: String,
    /// Engines may report negative or missing confidence.
    pub confidence: Option<f32>,
    /// None when the engine produced no word-level data.
    pub words: Option<Vec<OcrWord>>,
}

impl From<RawRecognition> for ExtractionResult {
    fn from(raw: RawRecognition) -> Self {
        let confidence = match raw.confidence {
            Some(c) if c.is_finite() => c.clamp(0.0, 100.0),
            _ => 0.0,
        };

        Self {
            text: raw.text,
            confidence,
            words: raw.words.unwrap_or_default(),
        }
    }
}

/// Error reported by an OCR engine. Its message is carried verbatim into
/// [`super::IngestError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// OCR engine abstraction (allows mocking for tests)
///
/// The lifecycle calls are made once, in order, by
/// [`super::EngineManager`]: `load_language`, `initialize`, `set_parameters`.
/// Callers must not run `recognize` concurrently on the same engine.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn load_language(&self, language: &str) -> Result<(), EngineError>;

    async fn initialize(&self, language: &str) -> Result<(), EngineError>;

    async fn set_parameters(&self, parameters: &[(&'static str, String)]) -> Result<(), EngineError>;

    async fn recognize(&self, image_bytes: &[u8]) -> Result<RawRecognition, EngineError>;

    async fn terminate(&self) -> Result<(), EngineError>;
}

/// Creates fresh, uninitialized engines.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    type Engine: OcrEngine + 'static;

    async fn spawn(&self) -> Result<Self::Engine, EngineError>;
}
