pub mod import;
pub mod extraction;
pub mod structuring;
pub mod batch;
pub mod report;
