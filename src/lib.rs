pub mod config;
pub mod models;
pub mod pipeline;
pub mod voice;

use tracing_subscriber::EnvFilter;

pub use pipeline::batch::{BatchProcessor, BatchReport};
pub use pipeline::extraction::{EngineManager, ExtractionResult, Extractor, IngestError};
pub use pipeline::import::DocumentFile;
pub use pipeline::structuring::classify_document;
pub use voice::{SpeechError, SpeechOptions, VoiceService};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Logs go to stderr so stdout stays free for report output.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
