//! Batch processing of uploaded report files.
//!
//! Files are extracted one at a time in input order through a single shared
//! engine. A failing file is logged and skipped; the batch itself never fails.

pub mod types;
pub mod runner;

pub use types::*;
pub use runner::*;
