//! Shared LLM client: Ollama/OpenAI providers, unified errors, health
//! checks, and fast/slow/embedding service profiles.
//!
//! This crate has no knowledge of code parsing, graphs, or vector storage;
//! it is consumed by `cv-summary` (hierarchical summary generation) and by
//! `cv-vector` (embedding generation) as a pure LLM transport layer.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::default_config;
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ConfigError, HealthError, Provider, ProviderError, ProviderErrorKind};
pub use health_service::{HealthService, HealthStatus};
pub use service_profiles::LlmServiceProfiles;
pub use services::ollama_service::OllamaService;
pub use services::open_ai_service::OpenAiService;
