use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("glob error: {0}")]
    Glob(#[from] globset::Error),

    #[error("cancelled")]
    Cancelled,
}

impl From<SyncError> for cv_core::CvError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Cancelled => cv_core::CvError::Cancelled,
            SyncError::Io(e) => cv_core::CvError::Io(e),
            SyncError::Json(e) => cv_core::CvError::Json(e),
            SyncError::Glob(e) => cv_core::CvError::Internal(e.to_string()),
        }
    }
}
