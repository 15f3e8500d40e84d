//! Library configuration, collection naming, and distance kinds.

use crate::errors::VectorError;

/// Distance metric kind for a Qdrant collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    Cosine,
    Dot,
    Euclid,
}

/// The four collections this store manages, per the data model's `VectorPayload` kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    CodeChunks,
    DocumentChunks,
    SummariesLevel1,
    SummariesLevel2,
    SummariesLevel3,
    SummariesLevel4,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::CodeChunks => "code_chunks",
            Collection::DocumentChunks => "document_chunks",
            Collection::SummariesLevel1 => "summaries_level_1",
            Collection::SummariesLevel2 => "summaries_level_2",
            Collection::SummariesLevel3 => "summaries_level_3",
            Collection::SummariesLevel4 => "summaries_level_4",
        }
    }

    pub fn all() -> [Collection; 6] {
        [
            Collection::CodeChunks,
            Collection::DocumentChunks,
            Collection::SummariesLevel1,
            Collection::SummariesLevel2,
            Collection::SummariesLevel3,
            Collection::SummariesLevel4,
        ]
    }

    pub fn for_summary_level(level: cv_core::model::SummaryLevel) -> Collection {
        use cv_core::model::SummaryLevel;
        match level {
            SummaryLevel::Symbol => Collection::SummariesLevel1,
            SummaryLevel::File => Collection::SummariesLevel2,
            SummaryLevel::Directory => Collection::SummariesLevel3,
            SummaryLevel::Repo => Collection::SummariesLevel4,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// High-level configuration for the vector store.
#[derive(Clone, Debug)]
pub struct VectorConfig {
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub distance: DistanceKind,
    /// Vector dimension shared by all managed collections.
    pub dim: usize,
    pub upsert_batch: usize,
    pub exact_search: bool,
    /// Maximum number of texts embedded per request to the provider.
    pub embed_batch_size: usize,
    /// Directory under `.cv/` holding the local on-disk fallback cache
    /// (`<local_cache_dir>/<collection>/*.json`).
    pub local_cache_dir: std::path::PathBuf,
}

impl VectorConfig {
    /// Builds a `VectorConfig` from the repo-scoped `.cv/config.json`'s
    /// `vector.*` keys, falling back to built-in defaults documented in
    /// the on-disk layout section.
    pub fn from_env(repo_root: impl AsRef<std::path::Path>) -> Result<Self, VectorError> {
        use std::env;
        let qdrant_url =
            env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string());
        let qdrant_api_key = env::var("QDRANT_API_KEY").ok();

        let dim = env::var("EMBEDDING_DIM")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(1536);

        let upsert_batch = env::var("QDRANT_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(256);

        let exact_search = env::var("EXACT_SEARCH")
            .ok()
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let embed_batch_size = env::var("EMBEDDING_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(64);

        Ok(Self {
            qdrant_url,
            qdrant_api_key,
            distance: DistanceKind::Cosine,
            dim,
            upsert_batch,
            exact_search,
            embed_batch_size,
            local_cache_dir: repo_root.as_ref().join(".cv").join("vectors"),
        })
    }

    pub fn validate(&self) -> Result<(), VectorError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(VectorError::Config("empty qdrant_url".into()));
        }
        if self.dim == 0 {
            return Err(VectorError::Config("dim must be > 0".into()));
        }
        Ok(())
    }
}
