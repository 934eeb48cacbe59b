//! Spoken read-back of extraction results.
//!
//! One utterance at a time: every `speak` cancels whatever is playing before
//! dispatching its own text.

pub mod types;
pub mod service;
pub mod command;

pub use types::*;
pub use service::*;
pub use command::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("Speech synthesis is not supported in this environment")]
    Unsupported,

    #[error("Speech synthesis failed: {code}")]
    Synthesis { code: String },

    #[error("Utterance was superseded before it finished")]
    Superseded,
}
