//! Structured error taxonomy for the core pipeline.
//!
//! Class 1 (input unavailable) and class 2 (insufficient warm-up) conditions
//! are represented as `Option`/neutral defaults at the call site, not as
//! errors — only class 3 (invariant violation) and class 4 (store I/O
//! failure) reach this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoldloopError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("store I/O failure: {0}")]
    StoreIo(#[from] rusqlite::Error),

    #[error("serialization failure: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GoldloopError>;
