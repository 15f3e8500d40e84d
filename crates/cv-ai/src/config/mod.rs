//! Configuration types and environment-driven constructors for LLM clients.

pub mod default_config;
pub mod llm_model_config;
pub mod llm_provider;
