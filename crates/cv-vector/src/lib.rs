//! Vector store: ingestion and retrieval over Qdrant, with a local on-disk
//! fallback cache used when the primary service is unreachable.
//!
//! [`VectorStore`] manages four collections (`code_chunks`,
//! `document_chunks`, `summaries_level_{1..4}`) over a single Qdrant
//! client, mirroring every write into the local cache so that searches can
//! fall back to in-process cosine similarity scoring when Qdrant is down.

pub mod config;
pub mod embed;
pub mod errors;
pub mod filters;
pub mod local_cache;
pub mod qdrant_facade;
pub mod record;

pub use config::{Collection, DistanceKind, VectorConfig};
pub use errors::VectorError;
pub use record::{SearchFilter, SearchHit, VectorRecord};

use cv_ai::LlmServiceProfiles;
use std::sync::Arc;
use tracing::{info, warn};

/// High-level facade wiring configuration, the Qdrant client, the local
/// fallback cache, and the embedding profile together.
pub struct VectorStore {
    cfg: VectorConfig,
    client: qdrant_facade::QdrantFacade,
    profiles: Arc<LlmServiceProfiles>,
}

impl VectorStore {
    /// Constructs a new store from the given configuration and a shared
    /// LLM service used for embeddings.
    pub fn new(cfg: VectorConfig, profiles: Arc<LlmServiceProfiles>) -> Result<Self, VectorError> {
        info!(qdrant_url = %cfg.qdrant_url, dim = cfg.dim, "VectorStore::new");
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self { cfg, client, profiles })
    }

    /// Embeds a batch of texts using the configured embedding profile.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, VectorError> {
        embed::embed_batch(&self.profiles, texts, self.cfg.dim, self.cfg.embed_batch_size).await
    }

    /// Ensures the named collection exists with the configured dimension.
    /// Falls back silently to local-cache-only mode if Qdrant is
    /// unreachable; the directory is created lazily on first write.
    pub async fn ensure_collection(&self, collection: Collection) -> Result<(), VectorError> {
        match self.client.ensure_collection(collection.name(), self.cfg.dim).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(collection = collection.name(), %e, "qdrant unreachable, continuing with local cache only");
                Ok(())
            }
        }
    }

    /// Upserts a batch of records into `collection`, writing to Qdrant and
    /// mirroring every record into the local fallback cache. Succeeds even
    /// if Qdrant is unreachable, as long as the local cache write succeeds.
    pub async fn upsert_batch(
        &self,
        collection: Collection,
        records: Vec<VectorRecord>,
    ) -> Result<u64, VectorError> {
        if records.is_empty() {
            return Ok(0);
        }
        if records.iter().any(|r| r.vector.len() != self.cfg.dim) {
            return Err(VectorError::VectorSizeMismatch {
                got: records.iter().map(|r| r.vector.len()).max().unwrap_or(0),
                want: self.cfg.dim,
            });
        }

        for record in &records {
            let payload_json = serde_json::to_value(&record.payload)?;
            local_cache::write_record(
                &self.cfg.local_cache_dir,
                collection.name(),
                &record.id,
                &record.vector,
                &payload_json,
            )?;
        }

        let points = records
            .iter()
            .map(|r| to_point_struct(r))
            .collect::<Result<Vec<_>, VectorError>>()?;

        match self.client.upsert_points(collection.name(), points).await {
            Ok(op_id) => Ok(op_id),
            Err(e) => {
                warn!(collection = collection.name(), %e, "qdrant upsert failed, records retained in local cache");
                Ok(0)
            }
        }
    }

    /// Searches `collection` for the `limit` nearest neighbors to
    /// `query_vector`. Tries Qdrant first; on any failure, transparently
    /// falls back to the local on-disk cache and tags every returned hit
    /// with `used_fallback = true`.
    pub async fn search(
        &self,
        collection: Collection,
        query_vector: Vec<f32>,
        limit: u64,
        min_score: f32,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchHit>, VectorError> {
        let qfilter = filter.as_ref().map(filters::to_qdrant_filter);

        match self
            .client
            .search(collection.name(), query_vector.clone(), limit, qfilter, self.cfg.exact_search)
            .await
        {
            Ok(hits) => Ok(hits
                .into_iter()
                .filter(|(_, score, _)| *score >= min_score)
                .map(|(id, score, payload)| SearchHit { id, score, payload, used_fallback: false })
                .collect()),
            Err(e) => {
                warn!(collection = collection.name(), %e, "qdrant search failed, using local fallback cache");
                let hits = local_cache::search(
                    &self.cfg.local_cache_dir,
                    collection.name(),
                    &query_vector,
                    limit,
                    min_score,
                    filter.as_ref(),
                )?;
                Ok(hits
                    .into_iter()
                    .map(|(id, score, payload)| SearchHit { id, score, payload, used_fallback: true })
                    .collect())
            }
        }
    }

    /// Searches across `code_chunks`, embedding `query` first.
    pub async fn search_code(
        &self,
        query: &str,
        limit: u64,
        min_score: f32,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchHit>, VectorError> {
        let vector = embed::embed_one(&self.profiles, query, self.cfg.dim).await?;
        self.search(Collection::CodeChunks, vector, limit, min_score, filter).await
    }

    /// Searches across `document_chunks`, embedding `query` first.
    pub async fn search_documents(
        &self,
        query: &str,
        limit: u64,
        min_score: f32,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchHit>, VectorError> {
        let vector = embed::embed_one(&self.profiles, query, self.cfg.dim).await?;
        self.search(Collection::DocumentChunks, vector, limit, min_score, filter).await
    }

    /// Tombstones every chunk owned by `file` in `collection`: both the
    /// Qdrant collection and the local fallback cache are purged. Used by
    /// the sync engine's deletion step for files removed from the working
    /// tree (archived documents are never routed through this path — they
    /// are upserted with a status flag instead).
    pub async fn delete_by_path(&self, collection: Collection, file: &str) -> Result<(), VectorError> {
        if let Err(e) = self.client.delete_by_field(collection.name(), "file", file).await {
            warn!(collection = collection.name(), file, %e, "qdrant delete failed, local cache still purged");
        }
        local_cache::delete_by_field(&self.cfg.local_cache_dir, collection.name(), "file", file)?;
        Ok(())
    }
}

fn to_point_struct(record: &VectorRecord) -> Result<qdrant_client::qdrant::PointStruct, VectorError> {
    let payload_json = serde_json::to_value(&record.payload)?;
    let serde_json::Value::Object(map) = payload_json else {
        return Err(VectorError::Config(format!("payload for id {} did not serialize to an object", record.id)));
    };

    let mut payload = std::collections::HashMap::new();
    for (k, v) in map {
        if v.is_null() {
            continue;
        }
        payload.insert(k, json_to_qvalue(v));
    }
    // the external id is neither a UUID nor an integer in general, so it is
    // kept in the payload and the point id is derived deterministically.
    payload.insert("id".to_string(), qdrant_client::qdrant::Value::from(record.id.clone()));

    let point_id = qdrant_facade::stable_point_id(&record.id).to_string();
    Ok(qdrant_client::qdrant::PointStruct::new(point_id, record.vector.clone(), payload))
}

fn json_to_qvalue(v: serde_json::Value) -> qdrant_client::qdrant::Value {
    use qdrant_client::qdrant::Value as QValue;
    match v {
        serde_json::Value::Null => QValue::from(false),
        serde_json::Value::Bool(b) => QValue::from(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                QValue::from(i)
            } else {
                QValue::from(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => QValue::from(s),
        other => QValue::from(other.to_string()),
    }
}
