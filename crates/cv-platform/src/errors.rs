//! Closed error taxonomy for platform adapters (§4.8): every adapter method
//! fails into the same six kinds regardless of which host answered.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlatformError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    Auth,
    NotFound,
    RateLimited,
    Network,
    InvalidRequest,
    Server,
}

#[derive(Debug, Error, Clone)]
#[error("{kind:?}: {message}")]
pub struct PlatformError {
    pub kind: PlatformErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl PlatformError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self { kind: PlatformErrorKind::Auth, message: message.into(), retryable: false }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { kind: PlatformErrorKind::NotFound, message: message.into(), retryable: false }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self { kind: PlatformErrorKind::RateLimited, message: message.into(), retryable: true }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self { kind: PlatformErrorKind::Network, message: message.into(), retryable: true }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self { kind: PlatformErrorKind::InvalidRequest, message: message.into(), retryable: false }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self { kind: PlatformErrorKind::Server, message: message.into(), retryable: true }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return PlatformError { kind: PlatformErrorKind::Network, message: "request timed out".into(), retryable: true };
        }
        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 | 403 => PlatformError::auth(format!("http status {code}")),
                404 => PlatformError::not_found(format!("http status {code}")),
                429 => PlatformError::rate_limited("rate limited by upstream"),
                500..=599 => PlatformError::server(format!("http status {code}")),
                _ => PlatformError::invalid_request(format!("http status {code}")),
            };
        }
        PlatformError::network(e.to_string())
    }
}

impl From<cv_credentials::CredentialError> for PlatformError {
    fn from(e: cv_credentials::CredentialError) -> Self {
        PlatformError::auth(e.to_string())
    }
}
