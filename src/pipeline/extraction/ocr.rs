use super::types::{BoundingBox, OcrWord};

#[cfg(feature = "ocr")]
pub use tesseract_backend::{TesseractEngine, TesseractFactory};

/// Native Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
mod tesseract_backend {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex, MutexGuard};

    use async_trait::async_trait;
    use tesseract::Tesseract;

    use super::parse_tsv_words;
    use crate::pipeline::extraction::types::{
        EngineError, EngineFactory, OcrEngine, RawRecognition,
    };

    /// Spawns [`TesseractEngine`]s reading traineddata from `tessdata_dir`,
    /// or from Tesseract's compiled-in path when None.
    pub struct TesseractFactory {
        tessdata_dir: Option<PathBuf>,
    }

    impl TesseractFactory {
        pub fn new(tessdata_dir: Option<PathBuf>) -> Self {
            Self { tessdata_dir }
        }
    }

    #[async_trait]
    impl EngineFactory for TesseractFactory {
        type Engine = TesseractEngine;

        async fn spawn(&self) -> Result<TesseractEngine, EngineError> {
            if let Some(dir) = &self.tessdata_dir {
                if !dir.is_dir() {
                    return Err(EngineError::new(format!(
                        "Tessdata directory not found: {}",
                        dir.display()
                    )));
                }
            }
            Ok(TesseractEngine {
                tessdata_dir: self.tessdata_dir.clone(),
                state: Arc::new(Mutex::new(EngineState::default())),
            })
        }
    }

    #[derive(Default)]
    struct EngineState {
        language: Option<String>,
        parameters: Vec<(&'static str, String)>,
        /// Initialized native handle, reused across recognitions. Tesseract's
        /// builder calls consume the handle, so a failed call leaves this
        /// empty and the next recognition rebuilds it from the stored
        /// configuration.
        handle: Option<Tesseract>,
    }

    /// One native Tesseract handle, initialized once and reused for every
    /// recognition. All native calls run on blocking threads behind the
    /// state lock.
    pub struct TesseractEngine {
        tessdata_dir: Option<PathBuf>,
        state: Arc<Mutex<EngineState>>,
    }

    #[async_trait]
    impl OcrEngine for TesseractEngine {
        async fn load_language(&self, language: &str) -> Result<(), EngineError> {
            let Some(dir) = &self.tessdata_dir else {
                return Ok(());
            };
            for part in language.split('+') {
                let traineddata = dir.join(format!("{part}.traineddata"));
                if !traineddata.exists() {
                    return Err(EngineError::new(format!(
                        "Traineddata for '{part}' not found in {}",
                        dir.display()
                    )));
                }
            }
            Ok(())
        }

        async fn initialize(&self, language: &str) -> Result<(), EngineError> {
            let datapath = self.datapath()?;
            let state = Arc::clone(&self.state);
            let lang = language.to_string();

            run_blocking(move || {
                let handle = build_handle(datapath.as_deref(), &lang, &[])?;
                let mut state = lock(&state);
                state.language = Some(lang);
                state.parameters.clear();
                state.handle = Some(handle);
                Ok(())
            })
            .await?;

            tracing::debug!(language, "Tesseract initialized");
            Ok(())
        }

        async fn set_parameters(
            &self,
            parameters: &[(&'static str, String)],
        ) -> Result<(), EngineError> {
            let state = Arc::clone(&self.state);
            let parameters = parameters.to_vec();

            run_blocking(move || {
                let mut state = lock(&state);
                let handle = state
                    .handle
                    .take()
                    .ok_or_else(|| EngineError::new("Tesseract engine is not initialized"))?;
                state.handle = Some(apply_parameters(handle, &parameters)?);
                state.parameters.extend(parameters);
                Ok(())
            })
            .await
        }

        async fn recognize(&self, image_bytes: &[u8]) -> Result<RawRecognition, EngineError> {
            let datapath = self.datapath()?;
            let state = Arc::clone(&self.state);
            let image = image_bytes.to_vec();

            run_blocking(move || {
                let mut state = lock(&state);
                let handle = match state.handle.take() {
                    Some(handle) => handle,
                    None => {
                        let language = state.language.clone().ok_or_else(|| {
                            EngineError::new("Tesseract engine is not initialized")
                        })?;
                        tracing::debug!(language = %language, "Rebuilding Tesseract handle");
                        build_handle(datapath.as_deref(), &language, &state.parameters)?
                    }
                };

                let mut handle = handle
                    .set_image_from_mem(&image)
                    .map_err(|e| EngineError::new(format!("{e:?}")))?
                    .recognize()
                    .map_err(|e| EngineError::new(format!("{e:?}")))?;

                let result = read_recognition(&mut handle);
                state.handle = Some(handle);
                result
            })
            .await
        }

        async fn terminate(&self) -> Result<(), EngineError> {
            *lock(&self.state) = EngineState::default();
            Ok(())
        }
    }

    impl TesseractEngine {
        fn datapath(&self) -> Result<Option<String>, EngineError> {
            self.tessdata_dir
                .as_deref()
                .map(|dir: &Path| {
                    dir.to_str()
                        .map(str::to_string)
                        .ok_or_else(|| EngineError::new("Invalid tessdata path"))
                })
                .transpose()
        }

        #[cfg(test)]
        fn has_handle(&self) -> bool {
            lock(&self.state).handle.is_some()
        }
    }

    fn lock(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
        state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn run_blocking<T: Send + 'static>(
        task: impl FnOnce() -> Result<T, EngineError> + Send + 'static,
    ) -> Result<T, EngineError> {
        tokio::task::spawn_blocking(task)
            .await
            .map_err(|e| EngineError::new(format!("Tesseract task failed: {e}")))?
    }

    fn build_handle(
        datapath: Option<&str>,
        language: &str,
        parameters: &[(&'static str, String)],
    ) -> Result<Tesseract, EngineError> {
        let handle = Tesseract::new(datapath, Some(language))
            .map_err(|e| EngineError::new(format!("{e:?}")))?;
        apply_parameters(handle, parameters)
    }

    fn apply_parameters(
        mut handle: Tesseract,
        parameters: &[(&'static str, String)],
    ) -> Result<Tesseract, EngineError> {
        for (name, value) in parameters {
            handle = handle
                .set_variable(name, value)
                .map_err(|e| EngineError::new(format!("Failed to set {name}: {e:?}")))?;
        }
        Ok(handle)
    }

    fn read_recognition(handle: &mut Tesseract) -> Result<RawRecognition, EngineError> {
        let text = handle
            .get_text()
            .map_err(|e| EngineError::new(format!("{e:?}")))?;
        let confidence = handle.mean_text_conf() as f32;

        // Word boxes are best-effort; text without them is still a result.
        let words = match handle.get_tsv_text(0) {
            Ok(tsv) => Some(parse_tsv_words(&tsv)),
            Err(e) => {
                tracing::debug!(error = ?e, "TSV output unavailable, omitting word boxes");
                None
            }
        };

        Ok(RawRecognition {
            text,
            confidence: Some(confidence),
            words,
        })
    }

}

/// Parse Tesseract TSV output into per-word confidence and bounding boxes.
/// TSV columns: level page_num block_num par_num line_num word_num left top width height conf text
/// Level 5 = individual word entries. Confidence stays on Tesseract's 0-100 scale.
#[cfg_attr(not(feature = "ocr"), allow(dead_code))]
pub(crate) fn parse_tsv_words(tsv: &str) -> Vec<OcrWord> {
    let mut results = Vec::new();

    for line in tsv.lines().skip(1) {
        // Skip header row
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // Level 5 = word
        let level: i32 = match fields[0].parse() {
            Ok(l) => l,
            Err(_) => continue,
        };
        if level != 5 {
            continue;
        }

        let conf: f32 = match fields[10].parse() {
            Ok(c) => c,
            Err(_) => continue,
        };

        let word = fields[11].trim();
        if word.is_empty() {
            continue;
        }

        let Some(bbox) = parse_bounding_box(fields[6], fields[7], fields[8], fields[9]) else {
            continue;
        };

        // Tesseract returns -1 for words it can't assign confidence to
        results.push(OcrWord {
            text: word.to_string(),
            confidence: conf.max(0.0),
            bbox,
        });
    }

    results
}

fn parse_bounding_box(left: &str, top: &str, width: &str, height: &str) -> Option<BoundingBox> {
    Some(BoundingBox::from_rect(
        left.parse().ok()?,
        top.parse().ok()?,
        width.parse().ok()?,
        height.parse().ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn tsv_parser_extracts_words_and_boxes() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t600\t800\t-1\t\n\
             5\t1\t1\t1\t1\t1\t10\t20\t80\t30\t95.5\tGlucose\n\
             5\t1\t1\t1\t1\t2\t100\t25\t60\t28\t88\t5.4"
        );
        let result = parse_tsv_words(&tsv);
        assert_eq!(result.len(), 2);

        assert_eq!(result[0].text, "Glucose");
        assert!((result[0].confidence - 95.5).abs() < f32::EPSILON);
        assert_eq!(result[0].bbox, BoundingBox { x0: 10, y0: 20, x1: 90, y1: 50 });

        assert_eq!(result[1].text, "5.4");
        assert_eq!(result[1].bbox, BoundingBox { x0: 100, y0: 25, x1: 160, y1: 53 });
    }

    #[test]
    fn tsv_parser_skips_non_word_levels() {
        // Level 1 = page, 2 = block, 3 = paragraph, 4 = line: all skipped
        let tsv = format!(
            "{HEADER}\n\
             2\t1\t1\t0\t0\t0\t10\t10\t580\t780\t-1\t\n\
             3\t1\t1\t1\t0\t0\t10\t10\t580\t780\t-1\t\n\
             4\t1\t1\t1\t1\t0\t10\t20\t200\t30\t-1\t\n\
             5\t1\t1\t1\t1\t1\t10\t20\t80\t30\t90\tPlatelet"
        );
        let result = parse_tsv_words(&tsv);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "Platelet");
    }

    #[test]
    fn tsv_parser_handles_negative_confidence() {
        let tsv = format!("{HEADER}\n5\t1\t1\t1\t1\t1\t10\t20\t80\t30\t-1\tgarbled");
        let result = parse_tsv_words(&tsv);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].confidence, 0.0);
    }

    #[test]
    fn tsv_parser_skips_empty_and_malformed_lines() {
        let tsv = format!(
            "{HEADER}\n\
             too\tfew\tfields\n\
             5\t1\t1\t1\t1\t1\t10\t20\t80\t30\t90\t\n\
             5\t1\t1\t1\t1\t2\tx\t20\t80\t30\t90\tnobox\n\
             5\t1\t1\t1\t1\t3\t10\t20\t80\t30\t92\tOK"
        );
        let result = parse_tsv_words(&tsv);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "OK");
    }

    #[test]
    fn tsv_parser_handles_empty_input() {
        assert!(parse_tsv_words("").is_empty());
        assert!(parse_tsv_words(HEADER).is_empty());
    }

    #[cfg(feature = "ocr")]
    #[tokio::test]
    async fn tesseract_factory_rejects_missing_tessdata() {
        use crate::pipeline::extraction::types::EngineFactory;

        let dir = tempfile::tempdir().unwrap();
        let factory = TesseractFactory::new(Some(dir.path().join("nope")));
        assert!(factory.spawn().await.is_err());
    }

    #[cfg(feature = "ocr")]
    #[tokio::test]
    async fn tesseract_load_language_checks_traineddata() {
        use crate::pipeline::extraction::types::{EngineFactory, OcrEngine};

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("eng.traineddata"), b"").unwrap();
        let engine = TesseractFactory::new(Some(dir.path().to_path_buf()))
            .spawn()
            .await
            .unwrap();

        assert!(engine.load_language("eng").await.is_ok());
        let err = engine.load_language("eng+fra").await.unwrap_err();
        assert!(err.to_string().contains("'fra'"));
    }
}
