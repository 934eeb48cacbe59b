//! Engine lifecycle: lazily creates one OCR engine, caches it, tears it down
//! on demand.
//!
//! The manager is an owned value rather than a global. Construct it once and
//! share it (`Arc<EngineManager<_>>`) with every extractor that needs OCR.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::types::{EngineError, EngineFactory, OcrEngine};
use super::IngestError;
use crate::config::OcrSettings;

pub struct EngineManager<F: EngineFactory> {
    factory: F,
    settings: OcrSettings,
    /// Held across initialization so concurrent callers wait for the
    /// in-flight setup instead of starting a second one.
    slot: Mutex<Option<Arc<F::Engine>>>,
}

impl<F: EngineFactory> EngineManager<F> {
    pub fn new(factory: F, settings: OcrSettings) -> Self {
        Self {
            factory,
            settings,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached engine, creating and configuring it on first use.
    ///
    /// A failed initialization leaves the cache empty so the next call retries.
    pub async fn ensure_engine(&self) -> Result<Arc<F::Engine>, IngestError> {
        let mut slot = self.slot.lock().await;
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let engine = match self.initialize().await {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                tracing::warn!(
                    language = %self.settings.language,
                    error = %e,
                    "OCR engine initialization failed"
                );
                return Err(IngestError::EngineInitialization(e.to_string()));
            }
        };

        tracing::info!(language = %self.settings.language, "OCR engine ready");
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Terminate and drop the cached engine. No-op when none exists.
    pub async fn dispose_engine(&self) {
        let engine = self.slot.lock().await.take();
        let Some(engine) = engine else {
            return;
        };

        match engine.terminate().await {
            Ok(()) => tracing::debug!("OCR engine terminated"),
            Err(e) => tracing::warn!(error = %e, "OCR engine termination failed"),
        }
    }

    pub async fn is_ready(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    async fn initialize(&self) -> Result<F::Engine, EngineError> {
        let engine = self.factory.spawn().await?;

        if let Err(e) = self.configure(&engine).await {
            // Half-configured engines are never cached; release what we can.
            if let Err(term) = engine.terminate().await {
                tracing::debug!(error = %term, "Cleanup after failed initialization failed");
            }
            return Err(e);
        }

        Ok(engine)
    }

    async fn configure(&self, engine: &F::Engine) -> Result<(), EngineError> {
        let language = &self.settings.language;
        engine.load_language(language).await?;
        engine.initialize(language).await?;
        engine
            .set_parameters(&self.settings.engine_parameters())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::mock::{MockEngineFactory, MockOcrEngine};

    fn manager(factory: MockEngineFactory) -> EngineManager<MockEngineFactory> {
        EngineManager::new(factory, OcrSettings::default())
    }

    #[tokio::test]
    async fn second_call_reuses_engine() {
        let factory = MockEngineFactory::new(MockOcrEngine::new(90.0));
        let spawned = factory.spawn_counter();
        let manager = manager(factory);

        let first = manager.ensure_engine().await.unwrap();
        let second = manager.ensure_engine().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(spawned.get(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_initialization() {
        let factory = MockEngineFactory::new(MockOcrEngine::new(90.0));
        let spawned = factory.spawn_counter();
        let manager = manager(factory);

        let (a, b, c) = tokio::join!(
            manager.ensure_engine(),
            manager.ensure_engine(),
            manager.ensure_engine()
        );

        let a = a.unwrap();
        assert!(Arc::ptr_eq(&a, &b.unwrap()));
        assert!(Arc::ptr_eq(&a, &c.unwrap()));
        assert_eq!(spawned.get(), 1);
    }

    #[tokio::test]
    async fn engine_is_configured_in_order() {
        let manager = manager(MockEngineFactory::new(MockOcrEngine::new(90.0)));
        let engine = manager.ensure_engine().await.unwrap();

        let calls = engine.lifecycle_calls();
        assert_eq!(
            calls,
            vec![
                "load_language:eng".to_string(),
                "initialize:eng".to_string(),
                "set_parameters:tessedit_char_whitelist,preserve_interword_spaces".to_string(),
            ]
        );
        assert_eq!(
            engine.parameter("preserve_interword_spaces").as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn failed_initialization_is_retried() {
        let factory = MockEngineFactory::new(MockOcrEngine::new(90.0)).failing_first(1);
        let spawned = factory.spawn_counter();
        let manager = manager(factory);

        let err = manager.ensure_engine().await.unwrap_err();
        assert!(matches!(err, IngestError::EngineInitialization(_)));
        assert!(!manager.is_ready().await);

        manager.ensure_engine().await.unwrap();
        assert!(manager.is_ready().await);
        assert_eq!(spawned.get(), 2);
    }

    #[tokio::test]
    async fn failed_configuration_terminates_engine() {
        let template = MockOcrEngine::new(90.0).failing_language_load("tessdata missing");
        let factory = MockEngineFactory::new(template);
        let terminated = factory.termination_counter();
        let manager = manager(factory);

        let err = manager.ensure_engine().await.unwrap_err();
        assert_eq!(err.message(), "tessdata missing");
        assert!(!manager.is_ready().await);
        assert_eq!(terminated.get(), 1);

        // Each failed attempt cleans up its own half-configured engine.
        manager.ensure_engine().await.unwrap_err();
        assert_eq!(terminated.get(), 2);
    }

    #[tokio::test]
    async fn dispose_clears_and_next_use_recreates() {
        let factory = MockEngineFactory::new(MockOcrEngine::new(90.0));
        let spawned = factory.spawn_counter();
        let manager = manager(factory);

        let first = manager.ensure_engine().await.unwrap();
        manager.dispose_engine().await;
        assert!(!manager.is_ready().await);
        assert!(first.is_terminated());

        let second = manager.ensure_engine().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(spawned.get(), 2);
    }

    #[tokio::test]
    async fn dispose_without_engine_is_noop() {
        let factory = MockEngineFactory::new(MockOcrEngine::new(90.0));
        let spawned = factory.spawn_counter();
        let manager = manager(factory);

        manager.dispose_engine().await;
        manager.dispose_engine().await;
        assert_eq!(spawned.get(), 0);
    }
}
