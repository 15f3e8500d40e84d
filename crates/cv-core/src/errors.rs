//! Crate-wide error kinds shared by every layer of the toolkit.
//!
//! The variant set is closed deliberately: every subsystem (parsers, sync,
//! graph, vector, credentials, platform adapters) maps its failures onto one
//! of these kinds so the CLI can pick a stable exit code and remediation
//! message without knowing which crate produced the error.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CvError>;

#[derive(Debug, Error)]
pub enum CvError {
    #[error("not in a repository (run `cv init` first)")]
    NotInRepo,

    #[error("repository not initialized (run `cv init` first)")]
    NotInitialized,

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Non-fatal: recorded in a sync report but never propagated past the
    /// sync engine boundary.
    #[error("parse warning: {0}")]
    ParseWarning(String),

    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream authentication failed: {0}")]
    UpstreamAuth(String),

    #[error("upstream rate limited: {0}")]
    UpstreamRateLimited(String),

    #[error("upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CvError {
    /// Fixed process exit code per the documented CLI surface.
    pub fn exit_code(&self) -> i32 {
        match self {
            CvError::NotInRepo | CvError::NotInitialized => 2,
            CvError::MissingCredential(_) => 3,
            CvError::UpstreamUnavailable(_)
            | CvError::UpstreamAuth(_)
            | CvError::UpstreamRateLimited(_)
            | CvError::UpstreamTimeout(_) => 4,
            CvError::Cancelled => 5,
            _ => 1,
        }
    }

    /// Whether an internal retry loop should attempt this error again.
    ///
    /// `missing_credential` and `upstream_auth` never retry silently; the
    /// caller must fix the credential and re-run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CvError::UpstreamUnavailable(_)
                | CvError::UpstreamRateLimited(_)
                | CvError::UpstreamTimeout(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CvError::NotInRepo => "not-in-repo",
            CvError::NotInitialized => "not-initialized",
            CvError::MissingCredential(_) => "missing-credential",
            CvError::InvalidInput(_) => "invalid-input",
            CvError::ParseWarning(_) => "parse-warning",
            CvError::UpstreamUnavailable(_) => "upstream-unavailable",
            CvError::UpstreamAuth(_) => "upstream-auth",
            CvError::UpstreamRateLimited(_) => "upstream-rate-limited",
            CvError::UpstreamTimeout(_) => "upstream-timeout",
            CvError::Conflict(_) => "conflict",
            CvError::Cancelled => "cancelled",
            CvError::Internal(_) => "internal",
            CvError::Io(_) => "internal",
            CvError::Json(_) => "internal",
        }
    }
}

/// Sanitizes a log line so secrets never reach `.cv/error.log`.
///
/// Replaces bearer tokens, `token=...`, `password=...`, `api[_-]?key=...`,
/// and known token prefixes (`sk-`, `ghp_`, `glpat-`) with `***`.
pub fn sanitize_log_line(line: &str) -> String {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<regex::Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        vec![
            regex::Regex::new(r"(?i)bearer\s+[a-z0-9._\-]+").unwrap(),
            regex::Regex::new(r"(?i)token=[^\s&]+").unwrap(),
            regex::Regex::new(r"(?i)password=[^\s&]+").unwrap(),
            regex::Regex::new(r"(?i)api[_-]?key=[^\s&]+").unwrap(),
            regex::Regex::new(r"sk-[a-zA-Z0-9]{8,}").unwrap(),
            regex::Regex::new(r"ghp_[a-zA-Z0-9]{8,}").unwrap(),
            regex::Regex::new(r"glpat-[a-zA-Z0-9_\-]{8,}").unwrap(),
        ]
    });

    let mut sanitized = line.to_string();
    for pattern in patterns {
        sanitized = pattern.replace_all(&sanitized, "***").into_owned();
    }
    sanitized
}
