//! Error types used across the vector store crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("embedding provider error: {0}")]
    Embed(#[from] cv_ai::AiLlmError),

    #[error("qdrant error: {0}")]
    Qdrant(String),

    #[error("vector size mismatch: got={got}, want={want}")]
    VectorSizeMismatch { got: usize, want: usize },

    #[error("unknown collection: {0}")]
    UnknownCollection(String),
}

impl VectorError {
    /// Maps onto the closed `CvError` kind set so the CLI can pick a stable
    /// exit code without depending on this crate's error shape.
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(self, VectorError::Qdrant(_))
    }
}
