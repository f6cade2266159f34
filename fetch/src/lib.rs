mod error;
mod fetch;
mod range;
mod validate;

pub use error::{Error, Result};
pub use fetch::RangeFetcher;
pub use range::ScanRange;
pub use validate::{validate_window_blocks, validate_window_logs};
