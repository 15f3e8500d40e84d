//! Local on-disk fallback cache used when the primary vector service is
//! unreachable.
//!
//! Records live under `.cv/vectors/<collection>/*.json`, one JSON record
//! per chunk, shaped `{id, vector, payload}`. Search loads every record in
//! the collection directory and scores it against the query vector with
//! in-process cosine similarity, following the scoring loop used by the
//! workspace's simpler in-memory vector search.

use crate::errors::VectorError;
use crate::filters::matches_filter;
use crate::record::SearchFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CachedRecord {
    id: String,
    vector: Vec<f32>,
    payload: serde_json::Value,
}

/// Writes one record to `<dir>/<collection>/<sanitized-id>.json`, replacing
/// any existing record with the same id. The write is durable: content is
/// written to a temp file in the same directory, then renamed into place.
pub fn write_record(
    cache_dir: &Path,
    collection: &str,
    id: &str,
    vector: &[f32],
    payload: &serde_json::Value,
) -> Result<(), VectorError> {
    let dir = cache_dir.join(collection);
    std::fs::create_dir_all(&dir)?;

    let record = CachedRecord {
        id: id.to_string(),
        vector: vector.to_vec(),
        payload: payload.clone(),
    };

    let path = record_path(&dir, id);
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(&record)?)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

fn record_path(dir: &Path, id: &str) -> PathBuf {
    let sanitized: String = id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    dir.join(format!("{sanitized}.json"))
}

/// Loads every cached record for `collection`, scores each against
/// `query_vector` with cosine similarity, applies `filter` if given, and
/// returns the top `limit` hits sorted by score descending. Every returned
/// hit is tagged `used_fallback = true`.
pub fn search(
    cache_dir: &Path,
    collection: &str,
    query_vector: &[f32],
    limit: u64,
    min_score: f32,
    filter: Option<&SearchFilter>,
) -> Result<Vec<(String, f32, serde_json::Value)>, VectorError> {
    let dir = cache_dir.join(collection);
    if !dir.exists() {
        debug!(collection, "no local fallback cache directory present");
        return Ok(Vec::new());
    }

    let mut scored = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.path().extension().map(|e| e == "json").unwrap_or(false) {
            continue;
        }
        let bytes = match std::fs::read(entry.path()) {
            Ok(b) => b,
            Err(e) => {
                warn!(path = ?entry.path(), %e, "failed reading cached vector record");
                continue;
            }
        };
        let record: CachedRecord = match serde_json::from_slice(&bytes) {
            Ok(r) => r,
            Err(e) => {
                warn!(path = ?entry.path(), %e, "failed parsing cached vector record");
                continue;
            }
        };

        if let Some(f) = filter {
            if !matches_filter(f, &record.payload) {
                continue;
            }
        }

        let score = cosine_similarity(query_vector, &record.vector);
        if score >= min_score {
            scored.push((record.id, score, record.payload));
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit as usize);
    Ok(scored)
}

/// Deletes every cached record in `collection` whose payload has
/// `field == value` (mirrors [`crate::qdrant_facade::QdrantFacade::delete_by_field`]
/// for the local fallback cache). Returns the number of records removed.
pub fn delete_by_field(cache_dir: &Path, collection: &str, field: &str, value: &str) -> Result<usize, VectorError> {
    let dir = cache_dir.join(collection);
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.path().extension().map(|e| e == "json").unwrap_or(false) {
            continue;
        }
        let bytes = match std::fs::read(entry.path()) {
            Ok(b) => b,
            Err(_) => continue,
        };
        let record: CachedRecord = match serde_json::from_slice(&bytes) {
            Ok(r) => r,
            Err(_) => continue,
        };
        if record.payload.get(field).and_then(|v| v.as_str()) == Some(value) {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn search_ranks_and_tags_fallback_results() {
        let dir = tempfile::tempdir().unwrap();
        write_record(
            dir.path(),
            "code_chunks",
            "a.rs:1",
            &[1.0, 0.0],
            &json!({"text": "alpha"}),
        )
        .unwrap();
        write_record(
            dir.path(),
            "code_chunks",
            "b.rs:1",
            &[0.0, 1.0],
            &json!({"text": "beta"}),
        )
        .unwrap();

        let hits = search(dir.path(), "code_chunks", &[1.0, 0.0], 5, 0.0, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, "a.rs:1");
        assert!(hits[0].1 > hits[1].1);
    }
}
