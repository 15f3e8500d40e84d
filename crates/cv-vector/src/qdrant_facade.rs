//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! This facade concentrates all Qdrant interactions behind a minimal API,
//! hiding away the verbose builder pattern and keeping the rest of the
//! crate decoupled from `qdrant-client`. Unlike a single-collection client,
//! every call here is parameterized by collection name so one facade serves
//! all four managed collections.

use crate::config::{DistanceKind, VectorConfig};
use crate::errors::VectorError;

use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, Filter, PointStruct, SearchParamsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use tracing::{debug, info, warn};

pub struct QdrantFacade {
    client: Qdrant,
    distance: DistanceKind,
}

impl QdrantFacade {
    pub fn new(cfg: &VectorConfig) -> Result<Self, VectorError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| VectorError::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            distance: cfg.distance,
        })
    }

    /// Ensures `collection` exists with a vector space of dimension `dim`.
    /// No-op if it already exists (dimension changes require a manual drop).
    pub async fn ensure_collection(&self, collection: &str, dim: usize) -> Result<(), VectorError> {
        info!(collection, dim, "ensuring collection exists");

        match self.client.collection_info(collection).await {
            Ok(_) => {
                debug!(collection, "collection already exists");
                return Ok(());
            }
            Err(err) => {
                warn!(collection, %err, "collection not found, creating");
            }
        }

        let distance = match self.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(dim as u64, distance)),
            )
            .await
            .map_err(|e| VectorError::Qdrant(e.to_string()))?;

        info!(collection, "collection created");
        Ok(())
    }

    pub async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<PointStruct>,
    ) -> Result<u64, VectorError> {
        if points.is_empty() {
            return Ok(0);
        }

        info!(collection, count = points.len(), "upserting points");

        let res = self
            .client
            .upsert_points(UpsertPointsBuilder::new(collection, points))
            .await
            .map_err(|e| VectorError::Qdrant(e.to_string()))?;

        Ok(res.result.and_then(|r| r.operation_id).unwrap_or(0))
    }

    /// Performs a similarity search. Returns `(id, score, payload)` tuples
    /// sorted by score descending (Qdrant's native order).
    pub async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<Filter>,
        exact: bool,
    ) -> Result<Vec<(String, f32, serde_json::Value)>, VectorError> {
        info!(collection, limit, exact, "searching collection");

        let mut builder = SearchPointsBuilder::new(collection, vector, limit).with_payload(true);

        if let Some(f) = filter {
            builder = builder.filter(f);
        }
        if exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| VectorError::Qdrant(e.to_string()))?;

        let mut out = Vec::with_capacity(res.result.len());
        for r in res.result.into_iter() {
            let id = point_id_to_string(&r.id);
            let payload_json = qpayload_to_json(r.payload);
            out.push((id, r.score, payload_json));
        }

        debug!(collection, hits = out.len(), "search completed");
        Ok(out)
    }

    /// Deletes every point whose payload has `field == value`. Used by the
    /// sync engine's tombstone step: chunk payloads carry `file`, so
    /// deleting everything owned by a removed path is one field-equality
    /// delete rather than a point-id enumeration.
    pub async fn delete_by_field(&self, collection: &str, field: &str, value: &str) -> Result<(), VectorError> {
        use qdrant_client::qdrant::{Condition, DeletePointsBuilder, Filter};

        info!(collection, field, value, "deleting points by field match");
        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(Filter::must([Condition::matches(field, value.to_string())])),
            )
            .await
            .map_err(|e| VectorError::Qdrant(e.to_string()))?;
        Ok(())
    }
}

/// Deterministic UUIDv5 from an arbitrary external record id. Qdrant point
/// ids must be a UUID or an unsigned integer; external ids (chunk ids like
/// `"src/a.ts:10"`, summary ids) are neither, so every upsert/search maps
/// through this function and relies on the payload's own `id` field (kept
/// by `VectorPayload`) for the externally-visible identity.
pub fn stable_point_id(external_id: &str) -> uuid::Uuid {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, external_id.as_bytes())
}

fn point_id_to_string(id: &Option<qdrant_client::qdrant::PointId>) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    match id.as_ref().and_then(|i| i.point_id_options.as_ref()) {
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into JSON.
fn qpayload_to_json(mut p: std::collections::HashMap<String, QValue>) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind as K;
    let mut m = serde_json::Map::new();
    for (k, v) in p.drain() {
        let j = match v.kind {
            Some(K::StringValue(s)) => serde_json::Value::String(s),
            Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
            Some(K::DoubleValue(f)) => serde_json::json!(f),
            Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
            None => serde_json::Value::Null,
            _ => serde_json::Value::Null,
        };
        m.insert(k, j);
    }
    serde_json::Value::Object(m)
}
