use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<GraphError> for cv_core::CvError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::NodeNotFound(m) => cv_core::CvError::InvalidInput(format!("node not found: {m}")),
            GraphError::InvalidQuery(m) => cv_core::CvError::InvalidInput(m),
            GraphError::Io(e) => cv_core::CvError::Io(e),
            GraphError::Json(e) => cv_core::CvError::Json(e),
        }
    }
}
