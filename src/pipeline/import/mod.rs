pub mod format;
pub mod file;

pub use format::*;
pub use file::*;
