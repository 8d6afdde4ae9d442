//! Error types for the stabilization engine.
//!
//! "No plate" and "no characters" are not errors: they surface as empty
//! strings, `None` crops and placeholder texts. Only conditions that stop
//! the pipeline itself are represented here.

use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, StabilizerError>;

#[derive(Error, Debug)]
pub enum StabilizerError {
    #[error("frame source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("frame source lost after {failures} consecutive failed reads")]
    SourceLost { failures: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("burst capture produced no frames")]
    EmptyBurst,

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StabilizerError {
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn source_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::SourceUnavailable(msg.into())
    }
}
