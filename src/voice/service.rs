use tokio::sync::watch;

use super::types::{voice_for_language, SpeechBackend, SpeechDefaults, SpeechOptions, Utterance};
use super::SpeechError;

/// Serializes speech requests over one backend.
///
/// Each `speak` or `stop` starts a new generation. A `speak` call only
/// dispatches if its generation is still current once its options are
/// resolved, and resolves with [`SpeechError::Superseded`] if a newer
/// generation starts while it is playing.
pub struct VoiceService<B: SpeechBackend> {
    backend: B,
    defaults: SpeechDefaults,
    generation: watch::Sender<u64>,
}

impl<B: SpeechBackend> VoiceService<B> {
    pub fn new(backend: B) -> Self {
        Self::with_defaults(backend, SpeechDefaults::default())
    }

    pub fn with_defaults(backend: B, defaults: SpeechDefaults) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            backend,
            defaults,
            generation,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    /// Speak `text`, cancelling anything already playing.
    ///
    /// Completes exactly once: `Ok` at the end of playback, `Synthesis` on a
    /// backend error, `Superseded` if a later `speak`/`stop` took over.
    pub async fn speak(&self, text: &str, options: SpeechOptions) -> Result<(), SpeechError> {
        if !self.backend.is_supported() {
            return Err(SpeechError::Unsupported);
        }

        let ticket = self.cancel_current();

        if text.trim().is_empty() {
            return Ok(());
        }

        let utterance = self.resolve(text, options).await;
        if *self.generation.borrow() != ticket {
            tracing::debug!(ticket, "Utterance superseded before dispatch");
            return Err(SpeechError::Superseded);
        }

        let mut newer = self.generation.subscribe();
        tracing::debug!(
            ticket,
            lang = %utterance.lang,
            voice = ?utterance.voice,
            "Dispatching utterance"
        );

        // Supersession wins over the backend's own cancellation error.
        tokio::select! {
            biased;
            _ = newer.wait_for(|current| *current != ticket) => Err(SpeechError::Superseded),
            outcome = self.backend.speak(utterance) => {
                if let Err(e) = &outcome {
                    tracing::warn!(ticket, error = %e, "Speech synthesis failed");
                }
                outcome
            }
        }
    }

    /// Cancel the current utterance, if any.
    pub fn stop(&self) {
        self.cancel_current();
    }

    pub fn pause(&self) {
        if self.backend.is_speaking() && !self.backend.is_paused() {
            self.backend.pause();
        }
    }

    pub fn resume(&self) {
        if self.backend.is_paused() {
            self.backend.resume();
        }
    }

    /// Start a new generation and cancel the backend. Returns the new
    /// generation.
    fn cancel_current(&self) -> u64 {
        let mut ticket = 0;
        self.generation.send_modify(|current| {
            *current += 1;
            ticket = *current;
        });
        self.backend.cancel();
        ticket
    }

    /// Explicit options, then a voice matching the language, then defaults.
    async fn resolve(&self, text: &str, options: SpeechOptions) -> Utterance {
        let lang = options.lang.unwrap_or_else(|| self.defaults.lang.clone());

        let voice = match options.voice {
            Some(voice) => Some(voice),
            None => {
                let voices = self.backend.voices().await;
                voice_for_language(&voices, &lang).map(|v| v.name.clone())
            }
        };

        Utterance {
            text: text.to_string(),
            rate: options.rate.unwrap_or(self.defaults.rate),
            pitch: options.pitch.unwrap_or(self.defaults.pitch),
            volume: options.volume.unwrap_or(self.defaults.volume),
            voice,
            lang,
        }
    }
}
