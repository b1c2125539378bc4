//! Error taxonomy for the learning subsystem. Extends `goldloop_core`'s
//! classes 1-4 with class 5, learning-cycle failure: fatal to that
//! iteration only, the previous active version remains untouched.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LearnError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("learning cycle failed in phase {phase}: {reason}")]
    LearningCycleFailed { phase: String, reason: String },

    #[error("store I/O failure: {0}")]
    StoreIo(#[from] rusqlite::Error),

    #[error("serialization failure: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] goldloop_core::error::GoldloopError),
}

pub type Result<T> = std::result::Result<T, LearnError>;
