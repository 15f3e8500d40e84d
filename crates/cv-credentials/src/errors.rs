//! Credential store error kind, convertible into [`cv_core::CvError`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CredentialError>;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential not found: {0:?}")]
    NotFound(CredentialKey),

    #[error("keychain backend unavailable: {0}")]
    KeychainUnavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid credential: {0}")]
    Invalid(String),
}

use crate::model::CredentialKey;

impl From<CredentialError> for cv_core::CvError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::NotFound(k) => {
                cv_core::CvError::MissingCredential(format!("{}/{}", k.credential_type, k.name))
            }
            CredentialError::KeychainUnavailable(m) => cv_core::CvError::UpstreamUnavailable(m),
            CredentialError::Io(e) => cv_core::CvError::Io(e),
            CredentialError::Json(e) => cv_core::CvError::Json(e),
            CredentialError::Invalid(m) => cv_core::CvError::InvalidInput(m),
        }
    }
}
