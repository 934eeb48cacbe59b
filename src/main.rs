use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use medscan_lib::config::{self, OcrSettings};
use medscan_lib::pipeline::batch::BatchProcessor;
use medscan_lib::pipeline::extraction::{EngineManager, Extractor, TesseractFactory};
use medscan_lib::pipeline::import::DocumentFile;
use medscan_lib::pipeline::report::{reports_from_batch, ProcessedReport};
use medscan_lib::voice::{CommandSpeechBackend, SpeechError, SpeechOptions, VoiceService};

#[derive(Parser, Debug)]
#[command(
    name = "medscan",
    version,
    about = "Extract and classify medical report scans"
)]
struct Cli {
    /// Report images to process, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// OCR language, e.g. eng or eng+fra (overrides MEDSCAN_OCR_LANG)
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Directory holding *.traineddata files (overrides MEDSCAN_TESSDATA_DIR)
    #[arg(long = "tessdata")]
    tessdata: Option<PathBuf>,

    /// Read a short summary of each report aloud
    #[arg(long = "speak")]
    speak: bool,

    /// Pretty-print the JSON output
    #[arg(long = "pretty")]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    medscan_lib::init_tracing();
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let mut settings = OcrSettings::from_env();
    if let Some(lang) = cli.lang {
        settings.language = lang;
    }
    if let Some(dir) = cli.tessdata {
        settings.tessdata_dir = Some(dir);
    }

    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        match DocumentFile::from_path(path).await {
            Ok(file) => files.push(file),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Cannot read file, skipping"),
        }
    }

    let factory = TesseractFactory::new(settings.tessdata_dir.clone());
    let engines = Arc::new(EngineManager::new(factory, settings));
    let processor = BatchProcessor::new(Extractor::new(Arc::clone(&engines)));

    let progress = |percent: f64| tracing::info!(percent, "Batch progress");
    let batch = processor.process_all_detailed(&files, Some(&progress)).await;
    engines.dispose_engine().await;

    if !batch.is_complete() {
        for failure in &batch.failures {
            tracing::error!(file = %failure.file_name, "{}", failure.message);
        }
    }
    tracing::info!(
        succeeded = batch.succeeded(),
        failed = batch.failures.len(),
        duration_ms = batch.duration_ms,
        "Batch finished"
    );

    let reports = reports_from_batch(batch);
    let output = if cli.pretty {
        serde_json::to_string_pretty(&reports)
    } else {
        serde_json::to_string(&reports)
    }
    .context("Failed to serialize reports")?;
    println!("{output}");

    if cli.speak {
        announce(&reports).await;
    }

    if reports.is_empty() {
        bail!("No file could be extracted");
    }
    Ok(())
}

async fn announce(reports: &[ProcessedReport]) {
    let voice = VoiceService::new(CommandSpeechBackend::detect());
    for report in reports {
        let text = format!(
            "{}: {}, confidence {:.0} percent",
            report.file_name, report.summary_context, report.extraction.confidence
        );
        match voice.speak(&text, SpeechOptions::default()).await {
            Ok(()) => {}
            Err(SpeechError::Unsupported) => {
                tracing::warn!("No speech synthesizer found, skipping read-back");
                return;
            }
            Err(e) => tracing::warn!(file = %report.file_name, error = %e, "Read-back failed"),
        }
    }
}
