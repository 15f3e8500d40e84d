//! `query(text, params)` escape hatch.
//!
//! Not a full Cypher parser — a small pattern-matched query language over
//! the in-memory graph: space-separated `key:value` filters on node kind,
//! edge label, and depth, rooted at a `from:` node. This is deliberately
//! modest; the typed operations on [`crate::GraphStore`] cover the named
//! contract operations, this exists only as the documented escape hatch.

use crate::errors::{GraphError, Result};
use crate::store::GraphStore;
use cv_core::model::{GraphEdgeLabel, GraphNode, NodeKind};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ParsedQuery {
    pub from: Option<String>,
    pub node_kind: Option<NodeKind>,
    pub edge_label: Option<GraphEdgeLabel>,
    pub depth: u32,
}

pub fn parse(text: &str) -> Result<ParsedQuery> {
    let mut q = ParsedQuery { depth: 2, ..Default::default() };
    for token in text.split_whitespace() {
        let Some((key, value)) = token.split_once(':') else {
            return Err(GraphError::InvalidQuery(format!("expected key:value, got `{token}`")));
        };
        match key {
            "from" => q.from = Some(value.to_string()),
            "node_kind" => {
                q.node_kind = Some(match value {
                    "symbol" => NodeKind::Symbol,
                    "file" => NodeKind::File,
                    "document" => NodeKind::Document,
                    "package" => NodeKind::Package,
                    other => return Err(GraphError::InvalidQuery(format!("unknown node_kind `{other}`"))),
                });
            }
            "edge" => {
                q.edge_label = Some(match value {
                    "calls" => GraphEdgeLabel::Calls,
                    "imports" => GraphEdgeLabel::Imports,
                    "defined_in" => GraphEdgeLabel::DefinedIn,
                    "describes" => GraphEdgeLabel::Describes,
                    "references_doc" => GraphEdgeLabel::ReferencesDoc,
                    "inherits" => GraphEdgeLabel::Inherits,
                    other => return Err(GraphError::InvalidQuery(format!("unknown edge label `{other}`"))),
                });
            }
            "depth" => {
                q.depth = value
                    .parse()
                    .map_err(|_| GraphError::InvalidQuery(format!("invalid depth `{value}`")))?;
            }
            other => return Err(GraphError::InvalidQuery(format!("unknown filter key `{other}`"))),
        }
    }
    Ok(q)
}

/// Runs a parsed query against the store, returning matching nodes.
pub fn run(store: &GraphStore, repo_id: &str, query: &ParsedQuery, _params: &HashMap<String, String>) -> Result<Vec<GraphNode>> {
    let candidates: Vec<GraphNode> = if let Some(from) = &query.from {
        let neighborhood = store.get_neighborhood(repo_id, from, query.depth, usize::MAX)?;
        neighborhood.nodes.into_iter().map(|d| d.node).collect()
    } else {
        store.nodes_for_repo(repo_id).cloned().collect()
    };

    let filtered: Vec<GraphNode> = candidates
        .into_iter()
        .filter(|n| query.node_kind.is_none_or(|k| k == n.kind))
        .collect();

    if let Some(label) = query.edge_label {
        let ids: std::collections::HashSet<String> = store
            .edges_for_repo(repo_id)
            .filter(|e| e.label == label)
            .flat_map(|e| [e.from.clone(), e.to.clone()])
            .collect();
        Ok(filtered.into_iter().filter(|n| ids.contains(&n.id)).collect())
    } else {
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_tokens() {
        let q = parse("node_kind:symbol depth:3").unwrap();
        assert_eq!(q.node_kind, Some(NodeKind::Symbol));
        assert_eq!(q.depth, 3);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(parse("not-a-pair").is_err());
        assert!(parse("node_kind:bogus").is_err());
    }
}
