//! Semantic-graph service: joins [`cv_vector::VectorStore`] search hits with
//! [`cv_graph::GraphStore`] traversal so callers get similarity plus
//! structure in one call.
//!
//! Every graph lookup here is best-effort: a symbol that a vector hit names
//! but that the graph doesn't know about (not yet synced, or a chunk that
//! isn't a whole-symbol match) degrades to an empty list rather than
//! failing the call. Only the vector layer itself, which every operation
//! depends on, can fail the whole request.

use crate::config::SemanticConfig;
use crate::errors::Result;
use cv_core::model::GraphNode;
use cv_graph::{DistancedNode, GraphStore, ImpactAnalysis, NeighborhoodResult};
use cv_vector::{SearchFilter, SearchHit, VectorStore};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::instrument;

const DEFAULT_TOP_K: u64 = 10;
const DEFAULT_GRAPH_DEPTH: u32 = 2;
const DEFAULT_MAX_RELATED: usize = 25;
const PER_HIT_NEIGHBOR_CAP: usize = 5;

/// Options shared by the two raw-query operations. A `top_k` of zero means
/// "use the default", mirroring the template's zero-is-default convention.
#[derive(Clone, Debug, Default)]
pub struct SearchOptions {
    pub top_k: u64,
    pub min_score: f32,
    pub filter: Option<SearchFilter>,
}

impl SearchOptions {
    fn resolved_top_k(&self) -> u64 {
        if self.top_k == 0 { DEFAULT_TOP_K } else { self.top_k }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExpandOptions {
    pub search: SearchOptions,
    pub graph_depth: u32,
    pub max_related: usize,
}

impl ExpandOptions {
    fn resolved_depth(&self) -> u32 {
        if self.graph_depth == 0 { DEFAULT_GRAPH_DEPTH } else { self.graph_depth }
    }

    fn resolved_max_related(&self) -> usize {
        if self.max_related == 0 { DEFAULT_MAX_RELATED } else { self.max_related }
    }
}

/// A vector hit enriched with its immediate graph neighborhood.
#[derive(Clone, Debug, Serialize)]
pub struct SemanticHit {
    pub id: String,
    pub score: f32,
    pub payload: serde_json::Value,
    pub used_fallback: bool,
    pub callers: Vec<GraphNode>,
    pub callees: Vec<GraphNode>,
    pub related: Vec<GraphNode>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExpandedContext {
    pub hits: Vec<SemanticHit>,
    pub related: Vec<DistancedNode>,
    pub languages: Vec<String>,
    pub files: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConceptCluster {
    pub hits: Vec<SemanticHit>,
    pub abstractions: Vec<GraphNode>,
    pub implementations: Vec<GraphNode>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SemanticBridge {
    pub bridge_ids: Vec<String>,
    pub shared_callers: Vec<GraphNode>,
    pub shared_callees: Vec<GraphNode>,
    pub path: Vec<GraphNode>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ComprehensiveContext {
    pub neighborhood: Option<NeighborhoodResult>,
    pub impact: Option<ImpactAnalysis>,
    pub similar: Vec<SemanticHit>,
}

/// Joins a [`VectorStore`] and a [`GraphStore`] scoped to one repo.
///
/// Both stores are borrowed rather than owned: the CLI loads a fresh
/// `GraphStore` once per invocation and this service is built on top of
/// that short-lived value, not a long-running process.
pub struct SemanticGraphService<'a> {
    graph: &'a GraphStore,
    vector: &'a VectorStore,
    repo_id: String,
    config: SemanticConfig,
}

impl<'a> SemanticGraphService<'a> {
    pub fn new(graph: &'a GraphStore, vector: &'a VectorStore, repo_id: impl Into<String>, config: SemanticConfig) -> Self {
        Self { graph, vector, repo_id: repo_id.into(), config }
    }

    /// Vector top-k over both code and document chunks, each hit enriched
    /// with up to 5 callers, 5 callees, and 5 non-call neighbors.
    #[instrument(skip(self, opts))]
    pub async fn semantic_search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<SemanticHit>> {
        let top_k = opts.resolved_top_k();
        let mut hits = self.raw_search(query, top_k, opts.min_score, opts.filter.clone()).await?;
        hits.truncate(top_k as usize);
        Ok(hits.into_iter().map(|h| self.enrich(h)).collect())
    }

    /// Primary hits plus a second BFS ring over their graph ids, capped at
    /// `opts.max_related`. Reports a language breakdown and the set of
    /// involved files across every hit and related node.
    #[instrument(skip(self, opts))]
    pub async fn expand_context(&self, query: &str, opts: &ExpandOptions) -> Result<ExpandedContext> {
        let hits = self.semantic_search(query, &opts.search).await?;
        let depth = opts.resolved_depth();
        let max_related = opts.resolved_max_related();

        let mut related: Vec<DistancedNode> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for hit in &hits {
            let Some(symbol_id) = symbol_id_from_payload(&hit.payload) else { continue };
            let Ok(neighborhood) = self.graph.get_neighborhood(&self.repo_id, &symbol_id, depth, max_related) else {
                continue;
            };
            for node in neighborhood.nodes {
                if node.distance == 0 {
                    continue;
                }
                if seen.insert(node.node.id.clone()) {
                    related.push(node);
                }
                if related.len() >= max_related {
                    break;
                }
            }
            if related.len() >= max_related {
                break;
            }
        }
        related.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.node.name.cmp(&b.node.name)));
        related.truncate(max_related);

        let mut languages: BTreeSet<String> = BTreeSet::new();
        let mut files: BTreeSet<String> = BTreeSet::new();
        for hit in &hits {
            if let Some(lang) = hit.payload.get("language").and_then(|v| v.as_str()) {
                languages.insert(lang.to_string());
            }
            if let Some(file) = hit.payload.get("file").and_then(|v| v.as_str()) {
                files.insert(file.to_string());
            }
        }
        for node in &related {
            if let Some(file) = &node.node.file {
                files.insert(file.clone());
            }
        }

        Ok(ExpandedContext {
            hits,
            related,
            languages: languages.into_iter().collect(),
            files: files.into_iter().collect(),
        })
    }

    /// Core semantic hits for `concept` plus graph-adjacent symbols split
    /// into abstractions (interfaces/types) and implementations (nodes with
    /// an INHERITS edge into one of the core hits).
    #[instrument(skip(self, opts))]
    pub async fn find_concept_cluster(&self, concept: &str, opts: &SearchOptions) -> Result<ConceptCluster> {
        let hits = self.semantic_search(concept, opts).await?;

        let mut abstractions: Vec<GraphNode> = Vec::new();
        let mut implementations: Vec<GraphNode> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();

        for hit in &hits {
            let Some(symbol_id) = symbol_id_from_payload(&hit.payload) else { continue };
            let Ok(neighborhood) = self.graph.get_neighborhood(&self.repo_id, &symbol_id, 1, 32) else {
                continue;
            };
            for dn in neighborhood.nodes {
                if dn.distance == 0 || !seen.insert(dn.node.id.clone()) {
                    continue;
                }
                if is_abstraction_name(&dn.node.name) {
                    abstractions.push(dn.node);
                } else {
                    implementations.push(dn.node);
                }
            }
        }
        abstractions.sort_by(|a, b| a.name.cmp(&b.name));
        implementations.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(ConceptCluster { hits, abstractions, implementations })
    }

    /// Intersects the top-k hit sets for two concepts. If they share no
    /// symbol directly, falls back to the shortest graph path between the
    /// best hit of each side (bounded by `graph.semantic_bridge_max_depth`)
    /// and reports the intermediate nodes as bridges.
    #[instrument(skip(self))]
    pub async fn find_semantic_bridge(&self, concept_a: &str, concept_b: &str) -> Result<SemanticBridge> {
        let opts = SearchOptions::default();
        let hits_a = self.semantic_search(concept_a, &opts).await?;
        let hits_b = self.semantic_search(concept_b, &opts).await?;

        let ids_a: BTreeSet<String> = hits_a.iter().filter_map(|h| symbol_id_from_payload(&h.payload)).collect();
        let ids_b: BTreeSet<String> = hits_b.iter().filter_map(|h| symbol_id_from_payload(&h.payload)).collect();
        let mut bridge_ids: Vec<String> = ids_a.intersection(&ids_b).cloned().collect();
        bridge_ids.sort();

        let mut path_nodes: Vec<GraphNode> = Vec::new();
        if bridge_ids.is_empty() {
            if let (Some(a), Some(b)) = (ids_a.iter().next(), ids_b.iter().next()) {
                if let Ok(path) = self.graph.find_path(&self.repo_id, a, b, self.config.semantic_bridge_max_depth) {
                    if path.found {
                        bridge_ids = path
                            .nodes
                            .iter()
                            .skip(1)
                            .take(path.nodes.len().saturating_sub(2))
                            .map(|n| n.id.clone())
                            .collect();
                        path_nodes = path.nodes;
                    }
                }
            }
        }

        let mut shared_callers: Vec<GraphNode> = Vec::new();
        let mut shared_callees: Vec<GraphNode> = Vec::new();
        if let (Some(a), Some(b)) = (ids_a.iter().next(), ids_b.iter().next()) {
            shared_callers = intersect_by_id(
                self.graph.get_callers(&self.repo_id, a).unwrap_or_default(),
                self.graph.get_callers(&self.repo_id, b).unwrap_or_default(),
            );
            shared_callees = intersect_by_id(
                self.graph.get_callees(&self.repo_id, a).unwrap_or_default(),
                self.graph.get_callees(&self.repo_id, b).unwrap_or_default(),
            );
        }

        Ok(SemanticBridge { bridge_ids, shared_callers, shared_callees, path: path_nodes })
    }

    /// Neighborhood plus impact analysis for `symbol_id`, plus semantically
    /// similar peers seeded by its docstring (or its qualified name, if it
    /// has none).
    #[instrument(skip(self, docstring))]
    pub async fn get_comprehensive_context(&self, symbol_id: &str, docstring: Option<&str>) -> Result<ComprehensiveContext> {
        let neighborhood = self.graph.get_neighborhood(&self.repo_id, symbol_id, 2, 50).ok();
        let impact = self.graph.get_impact_analysis(&self.repo_id, symbol_id, 3).ok();

        let seed = docstring.filter(|s| !s.trim().is_empty()).unwrap_or(symbol_id);
        let opts = SearchOptions { top_k: 5, ..Default::default() };
        let similar = self
            .semantic_search(seed, &opts)
            .await?
            .into_iter()
            .filter(|h| symbol_id_from_payload(&h.payload).as_deref() != Some(symbol_id))
            .collect();

        Ok(ComprehensiveContext { neighborhood, impact, similar })
    }

    async fn raw_search(&self, query: &str, top_k: u64, min_score: f32, filter: Option<SearchFilter>) -> Result<Vec<SemanticHit>> {
        let code = self.vector.search_code(query, top_k, min_score, filter.clone()).await?;
        let docs = self.vector.search_documents(query, top_k, min_score, filter).await?;
        let mut all: Vec<SearchHit> = code.into_iter().chain(docs).collect();
        all.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(all.into_iter().map(bare_hit).collect())
    }

    fn enrich(&self, hit: SemanticHit) -> SemanticHit {
        let Some(symbol_id) = symbol_id_from_payload(&hit.payload) else { return hit };

        let callers = self
            .graph
            .get_callers(&self.repo_id, &symbol_id)
            .map(|mut v| { v.truncate(PER_HIT_NEIGHBOR_CAP); v })
            .unwrap_or_default();
        let callees = self
            .graph
            .get_callees(&self.repo_id, &symbol_id)
            .map(|mut v| { v.truncate(PER_HIT_NEIGHBOR_CAP); v })
            .unwrap_or_default();
        let related = self
            .graph
            .get_neighborhood(&self.repo_id, &symbol_id, 1, PER_HIT_NEIGHBOR_CAP + 1)
            .map(|n| {
                n.nodes
                    .into_iter()
                    .filter(|dn| dn.distance > 0)
                    .map(|dn| dn.node)
                    .filter(|node| !callers.iter().any(|c| c.id == node.id) && !callees.iter().any(|c| c.id == node.id))
                    .take(PER_HIT_NEIGHBOR_CAP)
                    .collect()
            })
            .unwrap_or_default();

        SemanticHit { callers, callees, related, ..hit }
    }
}

fn bare_hit(hit: SearchHit) -> SemanticHit {
    SemanticHit {
        id: hit.id,
        score: hit.score,
        payload: hit.payload,
        used_fallback: hit.used_fallback,
        callers: Vec::new(),
        callees: Vec::new(),
        related: Vec::new(),
    }
}

/// Best-effort reconstruction of a symbol's graph id from a code-chunk
/// payload. Matches [`cv_core::ids::qualified_name`]'s no-owner form; a
/// symbol nested in a class or module won't resolve and the caller's
/// degrade-to-empty handling takes over.
fn symbol_id_from_payload(payload: &serde_json::Value) -> Option<String> {
    let name = payload.get("symbol_name").and_then(|v| v.as_str())?;
    let file = payload.get("file").and_then(|v| v.as_str())?;
    Some(cv_core::ids::qualified_name(file, &[], name))
}

fn is_abstraction_name(name: &str) -> bool {
    name.starts_with('I') && name.chars().nth(1).is_some_and(|c| c.is_uppercase())
        || name.ends_with("Trait")
        || name.ends_with("Interface")
        || name.ends_with("Abstract")
}

fn intersect_by_id(a: Vec<GraphNode>, b: Vec<GraphNode>) -> Vec<GraphNode> {
    let b_ids: BTreeSet<String> = b.iter().map(|n| n.id.clone()).collect();
    let mut out: Vec<GraphNode> = a.into_iter().filter(|n| b_ids.contains(&n.id)).collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_default_top_k_on_zero() {
        let opts = SearchOptions::default();
        assert_eq!(opts.resolved_top_k(), DEFAULT_TOP_K);
    }

    #[test]
    fn resolves_explicit_top_k() {
        let opts = SearchOptions { top_k: 3, ..Default::default() };
        assert_eq!(opts.resolved_top_k(), 3);
    }

    #[test]
    fn detects_abstraction_names() {
        assert!(is_abstraction_name("IShape"));
        assert!(is_abstraction_name("ShapeTrait"));
        assert!(!is_abstraction_name("Circle"));
        assert!(!is_abstraction_name("Id"));
    }

    #[test]
    fn symbol_id_requires_both_fields() {
        let v = serde_json::json!({"symbol_name": "run", "file": "src/a.rs"});
        assert_eq!(symbol_id_from_payload(&v).as_deref(), Some("src/a.rs:run"));
        let missing = serde_json::json!({"file": "src/a.rs"});
        assert_eq!(symbol_id_from_payload(&missing), None);
    }
}
