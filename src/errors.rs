//! Crate error types

use thiserror::Error;

/// Errors surfaced by the quantization core
#[derive(Debug, Error)]
pub enum Error {
    /// Quantization configured with an unusable precision (e.g. zero bits)
    #[error("invalid quantization config: {0}")]
    InvalidConfig(String),

    /// A replacement factory was applied to a layer whose parameter shapes
    /// do not match what the replacement expects
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// Checkpoint contents are inconsistent with the target network
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for quantization operations
pub type Result<T> = std::result::Result<T, Error>;
