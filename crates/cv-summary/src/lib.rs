//! Hierarchical summary service (§4.6): bottom-up symbol -> file ->
//! directory -> repo summarization, content-hash gated so unchanged nodes
//! are never regenerated.
//!
//! The template has no summarization pipeline. Grounded in `ai-llm-service`'s
//! LLM client shape (`LlmModelConfig`, `LlmServiceProfiles`) for the
//! "LLM if configured" path, generalized as `cv-ai`; the extractive fallback
//! is new, written in the plain-function style the template uses elsewhere
//! for small pure-data transforms (`codegraph-prep::core::ids`).

mod config;
mod errors;
mod generate;
mod keywords;
mod service;

pub use config::SummaryConfig;
pub use errors::{Result, SummaryError};
pub use service::HierarchicalSummarizer;
