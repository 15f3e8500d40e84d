//! Wires `cv-ai`'s environment-driven Ollama config and `cv-vector`'s
//! `VectorConfig::from_env` into the shared services every data-touching
//! command needs: embeddings always, fast/slow text generation only where
//! `cv-summary` asks for it.

use cv_ai::config::default_config::{config_ollama_embedding, config_ollama_fast, config_ollama_slow};
use cv_ai::LlmServiceProfiles;
use cv_core::CvError;
use cv_vector::{VectorConfig, VectorStore};
use std::path::Path;
use std::sync::Arc;

/// Builds the shared LLM service profiles from environment variables
/// (`OLLAMA_URL`/`OLLAMA_MODEL`/...). Required for embeddings; `cv-summary`
/// degrades to its extractive fallback on generation failures regardless.
pub fn build_llm_profiles() -> Result<Arc<LlmServiceProfiles>, CvError> {
    let fast = config_ollama_fast().map_err(|e| CvError::UpstreamUnavailable(e.to_string()))?;
    let slow = config_ollama_slow().ok();
    let embedding = config_ollama_embedding().map_err(|e| CvError::UpstreamUnavailable(e.to_string()))?;
    let profiles = LlmServiceProfiles::new(fast, slow, embedding, Some(10))
        .map_err(|e| CvError::UpstreamUnavailable(e.to_string()))?;
    Ok(Arc::new(profiles))
}

pub fn build_vector_store(repo_root: &Path, profiles: Arc<LlmServiceProfiles>) -> Result<VectorStore, CvError> {
    let cfg = VectorConfig::from_env(repo_root).map_err(|e| CvError::Internal(e.to_string()))?;
    cfg.validate().map_err(|e| CvError::InvalidInput(e.to_string()))?;
    VectorStore::new(cfg, profiles).map_err(|e| CvError::Internal(e.to_string()))
}
