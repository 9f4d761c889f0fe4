//! Error types for brewfinder.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
///
/// "Not found" is never an error inside the store: unknown ids come back as
/// `Ok(None)` or `Ok(false)`. The variants here cover file I/O, CSV bulk
/// load, config parsing, and a poisoned database lock.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("database lock poisoned")]
    Lock,
}
