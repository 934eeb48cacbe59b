use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::SpeechError;

/// Fallback utterance settings when neither options nor a voice say otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechDefaults {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub lang: String,
}

impl Default for SpeechDefaults {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            volume: 0.8,
            lang: "en-US".to_string(),
        }
    }
}

/// Per-call overrides. Unset fields fall back to the language-derived voice
/// and then to [`SpeechDefaults`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechOptions {
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
    pub voice: Option<String>,
    pub lang: Option<String>,
}

/// A voice offered by the synthesis backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP 47 tag, e.g. "en-US".
    pub lang: String,
}

/// Fully resolved request handed to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub voice: Option<String>,
    pub lang: String,
}

/// Speech synthesis capability.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Feature detection; callers check before speaking.
    fn is_supported(&self) -> bool;

    async fn voices(&self) -> Vec<Voice>;

    /// Play an utterance. Resolves when playback ends or the backend reports
    /// an error (including being cancelled).
    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError>;

    fn cancel(&self);

    fn pause(&self);

    fn resume(&self);

    fn is_speaking(&self) -> bool;

    fn is_paused(&self) -> bool;
}

/// Pick a voice for a language: exact tag match first, then same primary
/// language ("fr-FR" accepts "fr-CA").
pub fn voice_for_language<'a>(voices: &'a [Voice], lang: &str) -> Option<&'a Voice> {
    let primary = |tag: &str| tag.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();

    voices
        .iter()
        .find(|v| v.lang.replace('_', "-").eq_ignore_ascii_case(lang))
        .or_else(|| {
            let wanted = primary(lang);
            voices.iter().find(|v| primary(&v.lang) == wanted)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, lang: &str) -> Voice {
        Voice {
            name: name.into(),
            lang: lang.into(),
        }
    }

    #[test]
    fn defaults_match_read_back_settings() {
        let defaults = SpeechDefaults::default();
        assert!((defaults.rate - 0.9).abs() < f32::EPSILON);
        assert!((defaults.pitch - 1.0).abs() < f32::EPSILON);
        assert!((defaults.volume - 0.8).abs() < f32::EPSILON);
        assert_eq!(defaults.lang, "en-US");
    }

    #[test]
    fn exact_language_match_preferred() {
        let voices = vec![voice("Amelie", "fr-CA"), voice("Thomas", "fr-FR")];
        assert_eq!(voice_for_language(&voices, "fr-FR").unwrap().name, "Thomas");
    }

    #[test]
    fn primary_language_fallback() {
        let voices = vec![voice("Alex", "en-US"), voice("Amelie", "fr-CA")];
        assert_eq!(voice_for_language(&voices, "fr-FR").unwrap().name, "Amelie");
    }

    #[test]
    fn underscore_tags_match() {
        let voices = vec![voice("Daniel", "en_GB")];
        assert_eq!(voice_for_language(&voices, "en-GB").unwrap().name, "Daniel");
    }

    #[test]
    fn no_match_returns_none() {
        let voices = vec![voice("Alex", "en-US")];
        assert!(voice_for_language(&voices, "de-DE").is_none());
        assert!(voice_for_language(&[], "en-US").is_none());
    }
}
