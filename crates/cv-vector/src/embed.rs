//! Embedding generation, batched over `cv_ai::LlmServiceProfiles`'s
//! `embedding` profile.
//!
//! The backing LLM client has no notion of batching at the transport level
//! (`OllamaService`/`OpenAiService` both embed one string per request), so
//! batching here means bounding concurrency and checking every returned
//! vector against the configured dimension before it reaches Qdrant or the
//! local cache.

use crate::errors::VectorError;
use cv_ai::LlmServiceProfiles;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// Embeds `texts` using the `embedding` profile, running up to
/// `concurrency` requests at a time and checking every vector against
/// `expected_dim`.
pub async fn embed_batch(
    profiles: &LlmServiceProfiles,
    texts: &[String],
    expected_dim: usize,
    concurrency: usize,
) -> Result<Vec<Vec<f32>>, VectorError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    debug!(count = texts.len(), concurrency, "embedding batch");

    let results: Vec<Result<Vec<f32>, VectorError>> = stream::iter(texts.iter())
        .map(|text| async move {
            let vector = profiles.embed(text).await?;
            if vector.len() != expected_dim {
                return Err(VectorError::VectorSizeMismatch {
                    got: vector.len(),
                    want: expected_dim,
                });
            }
            Ok(vector)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut out = Vec::with_capacity(results.len());
    for r in results {
        match r {
            Ok(v) => out.push(v),
            Err(e) => {
                warn!(%e, "embedding failed");
                return Err(e);
            }
        }
    }
    Ok(out)
}

/// Embeds a single text, for single-query search paths.
pub async fn embed_one(
    profiles: &LlmServiceProfiles,
    text: &str,
    expected_dim: usize,
) -> Result<Vec<f32>, VectorError> {
    let vector = profiles.embed(text).await?;
    if vector.len() != expected_dim {
        return Err(VectorError::VectorSizeMismatch {
            got: vector.len(),
            want: expected_dim,
        });
    }
    Ok(vector)
}
