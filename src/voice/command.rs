//! Speech backends: a command-line synthesizer (`espeak` or macOS `say`) and
//! a stand-in for environments without any synthesizer.

use std::env;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Notify;

use super::types::{SpeechBackend, Utterance, Voice};
use super::SpeechError;

/// Backend for environments with no speech synthesis. Every `speak` fails
/// with [`SpeechError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSpeechBackend;

#[async_trait]
impl SpeechBackend for UnsupportedSpeechBackend {
    fn is_supported(&self) -> bool {
        false
    }

    async fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    async fn speak(&self, _utterance: Utterance) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn cancel(&self) {}

    fn pause(&self) {}

    fn resume(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }

    fn is_paused(&self) -> bool {
        false
    }
}

/// Which synthesizer binary drives playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthesizer {
    Espeak,
    Say,
}

impl Synthesizer {
    pub fn program(&self) -> &'static str {
        match self {
            Self::Espeak => "espeak",
            Self::Say => "say",
        }
    }

    /// Prefer `say` where present (macOS), then `espeak`.
    pub fn detect() -> Option<Self> {
        [Self::Say, Self::Espeak]
            .into_iter()
            .find(|s| command_exists(s.program()))
    }
}

// espeak's neutral values: 175 words/min, pitch 50 of 0-99, amplitude 100 of 0-200.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const ESPEAK_BASE_PITCH: f32 = 50.0;
const ESPEAK_BASE_AMPLITUDE: f32 = 100.0;

/// Speaks through a local synthesizer process. Cancelling kills the process.
///
/// Pause and resume are not available for external processes; `pause`
/// only logs, and `is_paused` is always false.
pub struct CommandSpeechBackend {
    synthesizer: Option<Synthesizer>,
    speaking: AtomicBool,
    cancelled: Notify,
}

impl CommandSpeechBackend {
    /// Detect an installed synthesizer. The backend reports itself as
    /// unsupported when none is found.
    pub fn detect() -> Self {
        Self::with_synthesizer(Synthesizer::detect())
    }

    pub fn with_synthesizer(synthesizer: Option<Synthesizer>) -> Self {
        Self {
            synthesizer,
            speaking: AtomicBool::new(false),
            cancelled: Notify::new(),
        }
    }

    /// Run one synthesizer process to completion, or kill it on `cancel`.
    async fn play(&self, program: &str, args: Vec<String>) -> Result<(), SpeechError> {
        let _speaking = SpeakingFlag::raise(&self.speaking);
        let cancelled = self.cancelled.notified();

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpeechError::Synthesis {
                code: format!("failed to run {program}: {e}"),
            })?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| SpeechError::Synthesis { code: e.to_string() })?;
                if status.success() {
                    Ok(())
                } else {
                    Err(SpeechError::Synthesis {
                        code: format!("{program} exited with {status}"),
                    })
                }
            }
            _ = cancelled => {
                if let Err(e) = child.kill().await {
                    tracing::debug!(error = %e, "Synthesizer already exited");
                }
                Err(SpeechError::Synthesis { code: "interrupted".into() })
            }
        }
    }
}

#[async_trait]
impl SpeechBackend for CommandSpeechBackend {
    fn is_supported(&self) -> bool {
        self.synthesizer.is_some()
    }

    async fn voices(&self) -> Vec<Voice> {
        let Some(synthesizer) = self.synthesizer else {
            return Vec::new();
        };
        let args: &[&str] = match synthesizer {
            Synthesizer::Espeak => &["--voices"],
            Synthesizer::Say => &["-v", "?"],
        };

        match Command::new(synthesizer.program()).args(args).output().await {
            Ok(output) if output.status.success() => {
                let listing = String::from_utf8_lossy(&output.stdout);
                match synthesizer {
                    Synthesizer::Espeak => parse_espeak_voices(&listing),
                    Synthesizer::Say => parse_say_voices(&listing),
                }
            }
            Ok(output) => {
                tracing::debug!(status = %output.status, "Voice listing failed");
                Vec::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Voice listing failed");
                Vec::new()
            }
        }
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        let synthesizer = self.synthesizer.ok_or(SpeechError::Unsupported)?;
        self.play(synthesizer.program(), synthesizer_args(synthesizer, &utterance))
            .await
    }

    fn cancel(&self) {
        self.cancelled.notify_waiters();
    }

    fn pause(&self) {
        tracing::debug!("Pause is not available for command-line synthesizers");
    }

    fn resume(&self) {}

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    fn is_paused(&self) -> bool {
        false
    }
}

/// Holds `is_speaking` true until playback ends or the speak future is dropped.
struct SpeakingFlag<'a>(&'a AtomicBool);

impl<'a> SpeakingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for SpeakingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Command-line arguments for one utterance.
pub fn synthesizer_args(synthesizer: Synthesizer, utterance: &Utterance) -> Vec<String> {
    let text = utterance.text.replace('\n', " ");
    let words_per_minute = (BASE_WORDS_PER_MINUTE * utterance.rate).round().max(1.0) as u32;

    match synthesizer {
        Synthesizer::Espeak => {
            let voice = utterance
                .voice
                .clone()
                .unwrap_or_else(|| utterance.lang.to_ascii_lowercase());
            let pitch = (ESPEAK_BASE_PITCH * utterance.pitch).round().clamp(0.0, 99.0) as u32;
            let amplitude =
                (ESPEAK_BASE_AMPLITUDE * utterance.volume).round().clamp(0.0, 200.0) as u32;
            vec![
                "-v".into(),
                voice,
                "-s".into(),
                words_per_minute.to_string(),
                "-p".into(),
                pitch.to_string(),
                "-a".into(),
                amplitude.to_string(),
                text,
            ]
        }
        // `say` has no pitch or volume flags.
        Synthesizer::Say => {
            let mut args = Vec::new();
            if let Some(voice) = &utterance.voice {
                args.push("-v".into());
                args.push(voice.clone());
            }
            args.push("-r".into());
            args.push(words_per_minute.to_string());
            args.push(text);
            args
        }
    }
}

/// Parse `espeak --voices`:
/// `Pty Language Age/Gender VoiceName File Other Languages`
fn parse_espeak_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [_, lang, _, name, ..] => Some(Voice {
                    name: (*name).to_string(),
                    lang: (*lang).to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Parse `say -v ?`: `Name   en_US    # sample sentence`.
/// Names may contain spaces, so the locale is the last token before `#`.
fn parse_say_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim();
            let (name, lang) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || !lang.contains('_') {
                return None;
            }
            Some(Voice {
                name: name.to_string(),
                lang: lang.replace('_', "-"),
            })
        })
        .collect()
}

/// Whether `cmd` resolves to an executable on PATH.
pub fn command_exists(cmd: &str) -> bool {
    let path = Path::new(cmd);
    if path.components().count() > 1 {
        return is_executable(path);
    }

    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };

    env::split_paths(&path_var).any(|dir| is_executable(&dir.join(cmd)))
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
