//! Error type for the semantic-graph service.

/// Errors surfaced by [`crate::SemanticGraphService`].
///
/// Graph lookups are treated as best-effort everywhere in this crate — a
/// missing node degrades the result, it never becomes one of these. These
/// variants are reserved for failures in the vector layer itself, which is
/// the one thing a semantic query cannot proceed without.
#[derive(Debug, thiserror::Error)]
pub enum SemanticError {
    #[error("vector search failed: {0}")]
    Vector(#[from] cv_vector::VectorError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

pub type Result<T> = std::result::Result<T, SemanticError>;

impl From<SemanticError> for cv_core::CvError {
    fn from(err: SemanticError) -> Self {
        match err {
            SemanticError::Vector(e) => cv_core::CvError::Internal(e.to_string()),
            SemanticError::InvalidQuery(msg) => cv_core::CvError::InvalidInput(msg),
        }
    }
}
