//! Canonical record and query types for the vector store's public API.

use cv_core::model::VectorPayload;
use serde::Serialize;
use serde_json::Value;

/// A single record to be upserted into a collection.
#[derive(Clone, Debug)]
pub struct VectorRecord {
    /// Stable external id; stored as the Qdrant point id (string) and as the
    /// local fallback cache's record filename stem.
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: VectorPayload,
}

/// Filter abstraction used by search methods, narrow enough to cover the
/// conventional `searchCode`/`searchDocuments` schemas without exposing the
/// backing client's filter DSL.
#[derive(Clone, Debug)]
pub enum SearchFilter {
    ByFieldEq { key: String, value: Value },
    And(Vec<SearchFilter>),
    Or(Vec<SearchFilter>),
}

impl SearchFilter {
    pub fn language(lang: impl Into<String>) -> Self {
        SearchFilter::ByFieldEq {
            key: "language".into(),
            value: Value::String(lang.into()),
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        SearchFilter::ByFieldEq {
            key: "file".into(),
            value: Value::String(path.into()),
        }
    }
}

/// Normalized search hit: `{id, score, payload}` plus fallback signaling.
#[derive(Clone, Debug, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: Value,
    /// True when this hit was produced by the local on-disk fallback cache
    /// rather than the primary vector service.
    pub used_fallback: bool,
}
