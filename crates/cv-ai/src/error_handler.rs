//! Error types and validation helpers for the AI/LLM client crate.
//!
//! This module defines the full error hierarchy used by the configuration
//! layer, the provider clients (Ollama/OpenAI), and the health checker, plus
//! small reusable helpers for reading/validating environment variables.
//!
//! All [`ConfigError`] messages include the suffix `[AI LLM Service]` so that
//! logs and bubbled-up errors can be easily attributed to this crate.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias for config-loading operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root error type returned by every public operation in this crate.
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/env-var problems.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider (Ollama/OpenAI) request failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Health-probe failure.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Low-level transport failure (connect/timeout/TLS) not tied to a status code.
    #[error("http transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),
}

impl AiLlmError {
    /// Whether a retry with backoff is worth attempting, per the retry policy
    /// for embed/platform calls (network, 5xx, 429 are transient).
    pub fn is_retryable(&self) -> bool {
        match self {
            AiLlmError::HttpTransport(_) => true,
            AiLlmError::Provider(p) => p.kind.is_retryable(),
            AiLlmError::Health(_) => true,
            AiLlmError::Config(_) => false,
        }
    }
}

/// A captured non-2xx HTTP response, kept small and loggable.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    pub snippet: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// Which upstream provider a [`ProviderError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAI,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ollama => write!(f, "Ollama"),
            Provider::OpenAI => write!(f, "OpenAI"),
        }
    }
}

/// The specific failure mode of a provider call.
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    #[error("config does not select this provider")]
    InvalidProvider,

    #[error("missing API key")]
    MissingApiKey,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected {0}")]
    HttpStatus(HttpError),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("response contained no choices")]
    EmptyChoices,
}

impl ProviderErrorKind {
    fn is_retryable(&self) -> bool {
        match self {
            ProviderErrorKind::Transport(_) => true,
            ProviderErrorKind::HttpStatus(h) => {
                h.status.as_u16() == 429 || h.status.is_server_error()
            }
            _ => false,
        }
    }
}

/// A failure from a specific provider, carrying which provider and why.
#[derive(Debug, Error)]
#[error("[{provider}] {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            provider: Provider::OpenAI,
            kind: ProviderErrorKind::Transport(e),
        }
    }
}

/// Health-probe specific errors (kept distinct from request errors so a
/// failed health check never looks like a failed generation).
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("unexpected {0}")]
    HttpStatus(HttpError),

    #[error("failed to decode health response: {0}")]
    Decode(String),
}

/// Error enum for environment/config-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time. Extend conservatively as needs arise.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in `ai.provider` / `LLM_KIND`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,

    /// Stop sequences contained one or more empty strings.
    #[error("[AI LLM Service] stop sequences must not contain empty strings")]
    InvalidStopSequence,
}

/* ------------------------ Env helpers ------------------------ */

/// Fetches a required, non-empty environment variable.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            }),
        _ => Ok(None),
    }
}

/* --------------------- Validation helpers --------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        })
    }
}

/// Validates that a floating-point value lies within an inclusive range.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        })
    }
}

/// Ensures that a list of stop sequences contains no empty strings.
pub fn validate_stop_sequences<S>(stops: &[S]) -> Result<()>
where
    S: AsRef<str>,
{
    if stops.iter().any(|s| s.as_ref().is_empty()) {
        Err(ConfigError::InvalidStopSequence)
    } else {
        Ok(())
    }
}

/// Clamps a response body to a short, loggable snippet (sanitization of
/// bearer-token-shaped substrings happens at the `cv-core` log-sink level;
/// this only bounds length).
pub fn make_snippet(body: &str) -> String {
    body.chars().take(240).collect()
}
