//! In-memory OCR engine for tests and offline runs without Tesseract.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::types::{BoundingBox, EngineError, EngineFactory, OcrEngine, OcrWord, RawRecognition};

/// Mock OCR engine: "recognizes" the file bytes as UTF-8 text.
///
/// Words get synthetic left-to-right boxes on a single line. Any input
/// containing the configured failure marker is rejected.
#[derive(Debug)]
pub struct MockOcrEngine {
    confidence: f32,
    fail_marker: Option<Vec<u8>>,
    language_error: Option<String>,
    calls: Mutex<Vec<String>>,
    parameters: Mutex<Vec<(String, String)>>,
    recognized: AtomicUsize,
    terminated: AtomicBool,
    /// Shared by every engine spawned from the same template.
    terminations: CallCounter,
}

impl MockOcrEngine {
    pub fn new(confidence: f32) -> Self {
        Self {
            confidence,
            fail_marker: None,
            language_error: None,
            calls: Mutex::new(Vec::new()),
            parameters: Mutex::new(Vec::new()),
            recognized: AtomicUsize::new(0),
            terminated: AtomicBool::new(false),
            terminations: CallCounter::default(),
        }
    }

    /// Fail recognition for any input containing `marker`.
    pub fn failing_on(mut self, marker: &[u8]) -> Self {
        self.fail_marker = Some(marker.to_vec());
        self
    }

    pub fn failing_language_load(mut self, message: &str) -> Self {
        self.language_error = Some(message.to_string());
        self
    }

    /// A new engine with the same behavior and no recorded state.
    fn fresh(&self) -> Self {
        Self {
            confidence: self.confidence,
            fail_marker: self.fail_marker.clone(),
            language_error: self.language_error.clone(),
            terminations: self.terminations.clone(),
            ..Self::new(self.confidence)
        }
    }

    pub fn lifecycle_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn parameter(&self, name: &str) -> Option<String> {
        self.parameters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn recognize_count(&self) -> usize {
        self.recognized.load(Ordering::SeqCst)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }
}

#[async_trait]
impl OcrEngine for MockOcrEngine {
    async fn load_language(&self, language: &str) -> Result<(), EngineError> {
        self.record(format!("load_language:{language}"));
        match &self.language_error {
            Some(message) => Err(EngineError::new(message.clone())),
            None => Ok(()),
        }
    }

    async fn initialize(&self, language: &str) -> Result<(), EngineError> {
        self.record(format!("initialize:{language}"));
        Ok(())
    }

    async fn set_parameters(&self, parameters: &[(&'static str, String)]) -> Result<(), EngineError> {
        let names: Vec<&str> = parameters.iter().map(|(n, _)| *n).collect();
        self.record(format!("set_parameters:{}", names.join(",")));
        self.parameters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(parameters.iter().map(|(n, v)| (n.to_string(), v.clone())));
        Ok(())
    }

    async fn recognize(&self, image_bytes: &[u8]) -> Result<RawRecognition, EngineError> {
        self.recognized.fetch_add(1, Ordering::SeqCst);

        if let Some(marker) = &self.fail_marker {
            if !marker.is_empty() && image_bytes.windows(marker.len()).any(|w| w == marker) {
                return Err(EngineError::new("Error attempting to read image"));
            }
        }

        let text = String::from_utf8_lossy(image_bytes).trim().to_string();
        let mut x = 0u32;
        let words = text
            .split_whitespace()
            .map(|w| {
                let width = w.chars().count() as u32 * 10;
                let word = OcrWord {
                    text: w.to_string(),
                    confidence: self.confidence,
                    bbox: BoundingBox::from_rect(x, 0, width, 20),
                };
                x += width + 10;
                word
            })
            .collect();

        Ok(RawRecognition {
            text,
            confidence: Some(self.confidence),
            words: Some(words),
        })
    }

    async fn terminate(&self) -> Result<(), EngineError> {
        self.terminated.store(true, Ordering::SeqCst);
        self.terminations.increment();
        Ok(())
    }
}

/// Shared call count, readable after the counted value has moved elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Factory producing [`MockOcrEngine`]s cloned from a template.
pub struct MockEngineFactory {
    template: MockOcrEngine,
    spawned: CallCounter,
    fail_first: usize,
}

impl MockEngineFactory {
    pub fn new(template: MockOcrEngine) -> Self {
        Self {
            template,
            spawned: CallCounter::default(),
            fail_first: 0,
        }
    }

    /// Make the first `attempts` spawns fail.
    pub fn failing_first(mut self, attempts: usize) -> Self {
        self.fail_first = attempts;
        self
    }

    pub fn spawn_counter(&self) -> CallCounter {
        self.spawned.clone()
    }

    /// Counts `terminate` calls across every engine this factory spawns.
    pub fn termination_counter(&self) -> CallCounter {
        self.template.terminations.clone()
    }
}

#[async_trait]
impl EngineFactory for MockEngineFactory {
    type Engine = MockOcrEngine;

    async fn spawn(&self) -> Result<MockOcrEngine, EngineError> {
        let attempt = self.spawned.increment();
        // Real engines load asynchronously; give other tasks a chance to run.
        tokio::task::yield_now().await;

        if attempt <= self.fail_first {
            return Err(EngineError::new("worker failed to start"));
        }
        Ok(self.template.fresh())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_ocr_returns_text_and_words() {
        let engine = MockOcrEngine::new(85.0);
        let raw = engine.recognize(b"Blood pressure normal").await.unwrap();
        assert_eq!(raw.text, "Blood pressure normal");
        assert_eq!(raw.confidence, Some(85.0));

        let words = raw.words.unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].text, "Blood");
        assert_eq!(words[0].bbox, BoundingBox { x0: 0, y0: 0, x1: 50, y1: 20 });
        assert_eq!(words[1].bbox.x0, 60);
    }

    #[tokio::test]
    async fn mock_ocr_fails_on_marker() {
        let engine = MockOcrEngine::new(85.0).failing_on(b"CORRUPT");
        let err = engine.recognize(b"xxCORRUPTxx").await.unwrap_err();
        assert_eq!(err.to_string(), "Error attempting to read image");
        assert_eq!(engine.recognize_count(), 1);
    }

    #[tokio::test]
    async fn factory_engines_do_not_share_state() {
        let factory = MockEngineFactory::new(MockOcrEngine::new(85.0));
        let a = factory.spawn().await.unwrap();
        let b = factory.spawn().await.unwrap();

        a.terminate().await.unwrap();
        assert!(a.is_terminated());
        assert!(!b.is_terminated());
        assert_eq!(factory.spawn_counter().get(), 2);
        assert_eq!(factory.termination_counter().get(), 1);
    }
}
