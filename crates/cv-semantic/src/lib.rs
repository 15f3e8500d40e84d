//! Semantic-graph service (§4.5): joins [`cv_vector::VectorStore`] search
//! hits with [`cv_graph::GraphStore`] traversal primitives.
//!
//! Grounded in the template's `contextor` crate, which already joins
//! retrieval hits with graph context for MR review; this crate generalizes
//! that one-shot join into five named operations, reading from `cv-graph`
//! and `cv-vector` directly instead of `contextor`'s MR-specific framing.

mod config;
mod errors;
mod service;

pub use config::SemanticConfig;
pub use errors::{Result, SemanticError};
pub use service::{
    ComprehensiveContext, ConceptCluster, ExpandOptions, ExpandedContext, SearchOptions, SemanticBridge,
    SemanticGraphService, SemanticHit,
};
