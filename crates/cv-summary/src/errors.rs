//! Error type for the hierarchical summary service.

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("generation failed: {0}")]
    Generation(#[from] cv_ai::AiLlmError),

    #[error("vector store error: {0}")]
    Vector(#[from] cv_vector::VectorError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, SummaryError>;

impl From<SummaryError> for cv_core::CvError {
    fn from(err: SummaryError) -> Self {
        match err {
            SummaryError::Generation(e) => cv_core::CvError::Internal(e.to_string()),
            SummaryError::Vector(e) => cv_core::CvError::Internal(e.to_string()),
            SummaryError::InvalidInput(msg) => cv_core::CvError::InvalidInput(msg),
        }
    }
}
