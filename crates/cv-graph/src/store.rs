//! In-process property graph, keyed by `(repoId, nodeId)`.
//!
//! There is no external graph database in the pack this toolkit is grounded
//! on (`codegraph-prep` serializes a `petgraph` structure once per run); this
//! store keeps that shape and generalizes it with the traversal primitives
//! §4.3 requires, persisting to `.cv/graph.json` between syncs.

use crate::errors::{GraphError, Result};
use cv_core::model::{GraphEdge, GraphEdgeLabel, GraphNode, NodeKind, SymbolNode};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use tracing::{debug, instrument};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct NeighborhoodResult {
    pub nodes: Vec<DistancedNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct DistancedNode {
    #[serde(flatten)]
    pub node: GraphNode,
    pub distance: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct PathResult {
    pub found: bool,
    pub nodes: Vec<GraphNode>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Default)]
pub struct ImpactAnalysis {
    pub direct_callers: Vec<GraphNode>,
    pub transitive_callers: Vec<GraphNode>,
    pub affected_files: Vec<String>,
}

/// The graph store itself. One `StableDiGraph` for the whole process; every
/// public operation is scoped to a `repo_id` so multi-repo state never
/// leaks across queries.
#[derive(Default)]
pub struct GraphStore {
    graph: StableDiGraph<GraphNode, GraphEdge>,
    index: HashMap<(String, String), NodeIndex>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn key(repo_id: &str, id: &str) -> (String, String) {
        (repo_id.to_string(), id.to_string())
    }

    fn get_or_create_node(&mut self, node: GraphNode) -> NodeIndex {
        let key = Self::key(&node.repo_id, &node.id);
        if let Some(&idx) = self.index.get(&key) {
            self.graph[idx] = node;
            idx
        } else {
            let idx = self.graph.add_node(node);
            self.index.insert(key, idx);
            idx
        }
    }

    fn find_node(&self, repo_id: &str, id: &str) -> Option<NodeIndex> {
        self.index.get(&Self::key(repo_id, id)).copied()
    }

    // --- Upserts ---------------------------------------------------------

    #[instrument(skip(self, symbol))]
    pub fn upsert_symbol_node(&mut self, repo_id: &str, symbol: &SymbolNode) -> NodeIndex {
        let idx = self.get_or_create_node(GraphNode {
            id: symbol.qualified_name.clone(),
            kind: NodeKind::Symbol,
            name: symbol.name.clone(),
            file: Some(symbol.file.clone()),
            repo_id: repo_id.to_string(),
            status: None,
        });
        let file_idx = self.upsert_file_node(repo_id, &symbol.file);
        self.create_edge_idempotent(GraphEdge {
            label: GraphEdgeLabel::DefinedIn,
            from: symbol.qualified_name.clone(),
            to: symbol.file.clone(),
            repo_id: repo_id.to_string(),
            is_conditional: None,
            line: Some(symbol.start_line),
        }, idx, file_idx);
        idx
    }

    #[instrument(skip(self))]
    pub fn upsert_file_node(&mut self, repo_id: &str, path: &str) -> NodeIndex {
        self.get_or_create_node(GraphNode {
            id: path.to_string(),
            kind: NodeKind::File,
            name: path.to_string(),
            file: Some(path.to_string()),
            repo_id: repo_id.to_string(),
            status: None,
        })
    }

    /// Idempotent: preserves an existing node's `status` (e.g. `"archived"`)
    /// across re-upserts triggered by unrelated edge creation.
    #[instrument(skip(self))]
    pub fn upsert_document_node(&mut self, repo_id: &str, path: &str) -> NodeIndex {
        let id = format!("doc:{path}");
        let existing_status = self.find_node(repo_id, &id).and_then(|idx| self.graph[idx].status.clone());
        self.get_or_create_node(GraphNode {
            id,
            kind: NodeKind::Document,
            name: path.to_string(),
            file: Some(path.to_string()),
            repo_id: repo_id.to_string(),
            status: existing_status,
        })
    }

    /// Marks a document node's lifecycle `status` (e.g. `"archived"`) without
    /// touching its edges, creating the node first if it doesn't exist yet.
    #[instrument(skip(self))]
    pub fn set_document_status(&mut self, repo_id: &str, path: &str, status: impl Into<String>) -> NodeIndex {
        let idx = self.upsert_document_node(repo_id, path);
        self.graph[idx].status = Some(status.into());
        idx
    }

    fn upsert_package_node(&mut self, repo_id: &str, name: &str) -> NodeIndex {
        self.get_or_create_node(GraphNode {
            id: format!("pkg:{name}"),
            kind: NodeKind::Package,
            name: name.to_string(),
            file: None,
            repo_id: repo_id.to_string(),
            status: None,
        })
    }

    /// Idempotent on `(label, from, to, repo_id)`: an existing edge's
    /// mutable fields (`is_conditional`, `line`) are refreshed in place
    /// rather than a duplicate edge being added.
    fn create_edge_idempotent(&mut self, edge: GraphEdge, from: NodeIndex, to: NodeIndex) {
        if let Some(existing) = self
            .graph
            .edges_connecting(from, to)
            .find(|e| e.weight().label == edge.label)
            .map(|e| e.id())
        {
            if let Some(w) = self.graph.edge_weight_mut(existing) {
                *w = edge;
            }
            return;
        }
        self.graph.add_edge(from, to, edge);
    }

    /// Creates a CALLS edge. If `callee` resolves to no known symbol, a
    /// placeholder `Package` node is created for it per the data-model
    /// invariant that both endpoints exist.
    #[instrument(skip(self))]
    pub fn create_calls_edge(&mut self, repo_id: &str, caller: &str, callee: &str, is_conditional: bool, line: usize) {
        let from = match self.find_node(repo_id, caller) {
            Some(idx) => idx,
            None => {
                debug!(caller, "create_calls_edge: caller missing, creating placeholder");
                self.upsert_package_node(repo_id, caller)
            }
        };
        let to = match self.find_node(repo_id, callee) {
            Some(idx) => idx,
            None => self.upsert_package_node(repo_id, callee),
        };
        self.create_edge_idempotent(
            GraphEdge {
                label: GraphEdgeLabel::Calls,
                from: caller.to_string(),
                to: callee.to_string(),
                repo_id: repo_id.to_string(),
                is_conditional: Some(is_conditional),
                line: Some(line),
            },
            from,
            to,
        );
    }

    #[instrument(skip(self))]
    pub fn create_imports_edge(&mut self, repo_id: &str, from_file: &str, to_target: &str, line: usize) {
        let from = self.upsert_file_node(repo_id, from_file);
        let to = match self.find_node(repo_id, to_target) {
            Some(idx) => idx,
            None => self.upsert_package_node(repo_id, to_target),
        };
        self.create_edge_idempotent(
            GraphEdge {
                label: GraphEdgeLabel::Imports,
                from: from_file.to_string(),
                to: to_target.to_string(),
                repo_id: repo_id.to_string(),
                is_conditional: None,
                line: Some(line),
            },
            from,
            to,
        );
    }

    #[instrument(skip(self))]
    pub fn create_describes_edge(&mut self, repo_id: &str, doc_path: &str, described_path: &str) {
        let from = self.upsert_document_node(repo_id, doc_path);
        let to = self.upsert_file_node(repo_id, described_path);
        self.create_edge_idempotent(
            GraphEdge {
                label: GraphEdgeLabel::Describes,
                from: format!("doc:{doc_path}"),
                to: described_path.to_string(),
                repo_id: repo_id.to_string(),
                is_conditional: None,
                line: None,
            },
            from,
            to,
        );
    }

    #[instrument(skip(self))]
    pub fn create_references_doc_edge(&mut self, repo_id: &str, from_doc: &str, to_doc: &str) {
        let from = self.upsert_document_node(repo_id, from_doc);
        let to = self.upsert_document_node(repo_id, to_doc);
        self.create_edge_idempotent(
            GraphEdge {
                label: GraphEdgeLabel::ReferencesDoc,
                from: format!("doc:{from_doc}"),
                to: format!("doc:{to_doc}"),
                repo_id: repo_id.to_string(),
                is_conditional: None,
                line: None,
            },
            from,
            to,
        );
    }

    #[instrument(skip(self))]
    pub fn create_inherits_edge(&mut self, repo_id: &str, child: &str, parent: &str) {
        let from = match self.find_node(repo_id, child) {
            Some(idx) => idx,
            None => self.upsert_package_node(repo_id, child),
        };
        let to = match self.find_node(repo_id, parent) {
            Some(idx) => idx,
            None => self.upsert_package_node(repo_id, parent),
        };
        self.create_edge_idempotent(
            GraphEdge {
                label: GraphEdgeLabel::Inherits,
                from: child.to_string(),
                to: parent.to_string(),
                repo_id: repo_id.to_string(),
                is_conditional: None,
                line: None,
            },
            from,
            to,
        );
    }

    // --- Traversal ---------------------------------------------------------

    pub fn get_callers(&self, repo_id: &str, name: &str) -> Result<Vec<GraphNode>> {
        let idx = self
            .find_node(repo_id, name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))?;
        let mut callers: Vec<GraphNode> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .filter(|e| e.weight().label == GraphEdgeLabel::Calls)
            .map(|e| self.graph[e.source()].clone())
            .collect();
        callers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(callers)
    }

    pub fn get_callees(&self, repo_id: &str, name: &str) -> Result<Vec<GraphNode>> {
        let idx = self
            .find_node(repo_id, name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))?;
        let mut callees: Vec<GraphNode> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Outgoing)
            .filter(|e| e.weight().label == GraphEdgeLabel::Calls)
            .map(|e| self.graph[e.target()].clone())
            .collect();
        callees.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(callees)
    }

    /// BFS bounded by `depth` and `max_nodes`. `depth = 0` returns exactly
    /// `{target}` with no edges. Ties within a BFS frontier are broken by
    /// edge-type priority, then by neighbor name; the returned node list is
    /// sorted by `(distance asc, name asc)` regardless of discovery order.
    #[instrument(skip(self))]
    pub fn get_neighborhood(&self, repo_id: &str, name: &str, depth: u32, max_nodes: usize) -> Result<NeighborhoodResult> {
        let start = self
            .find_node(repo_id, name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))?;

        let mut distances: HashMap<NodeIndex, u32> = HashMap::new();
        distances.insert(start, 0);
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let dist = distances[&current];
            if dist >= depth || distances.len() >= max_nodes {
                continue;
            }
            let mut neighbors: Vec<(u8, String, NodeIndex)> = self
                .graph
                .edges(current)
                .chain(self.graph.edges_directed(current, petgraph::Direction::Incoming))
                .map(|e| {
                    let other = if e.source() == current { e.target() } else { e.source() };
                    (e.weight().label.traversal_priority(), self.graph[other].name.clone(), other)
                })
                .collect();
            neighbors.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

            for (_, _, other) in neighbors {
                if distances.len() >= max_nodes {
                    break;
                }
                distances.entry(other).or_insert_with(|| {
                    queue.push_back(other);
                    dist + 1
                });
            }
        }

        let visited: HashSet<NodeIndex> = distances.keys().copied().collect();
        let mut nodes: Vec<DistancedNode> = distances
            .iter()
            .map(|(&idx, &dist)| DistancedNode {
                node: self.graph[idx].clone(),
                distance: dist,
            })
            .collect();
        nodes.sort_by(|a, b| a.distance.cmp(&b.distance).then(a.node.name.cmp(&b.node.name)));

        let mut edges: Vec<GraphEdge> = self
            .graph
            .edge_references()
            .filter(|e| visited.contains(&e.source()) && visited.contains(&e.target()))
            .map(|e| e.weight().clone())
            .collect();
        edges.sort_by(|a, b| {
            a.label
                .traversal_priority()
                .cmp(&b.label.traversal_priority())
                .then(a.from.cmp(&b.from))
                .then(a.to.cmp(&b.to))
        });

        Ok(NeighborhoodResult { nodes, edges })
    }

    /// Shortest undirected path, BFS bounded by `max_depth`.
    #[instrument(skip(self))]
    pub fn find_path(&self, repo_id: &str, from: &str, to: &str, max_depth: u32) -> Result<PathResult> {
        let start = self
            .find_node(repo_id, from)
            .ok_or_else(|| GraphError::NodeNotFound(from.to_string()))?;
        let goal = self
            .find_node(repo_id, to)
            .ok_or_else(|| GraphError::NodeNotFound(to.to_string()))?;

        if start == goal {
            return Ok(PathResult { found: true, nodes: vec![self.graph[start].clone()] });
        }

        let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut depths: HashMap<NodeIndex, u32> = HashMap::new();
        depths.insert(start, 0);
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let dist = depths[&current];
            if dist >= max_depth {
                continue;
            }
            let mut neighbors: Vec<NodeIndex> = self
                .graph
                .edges(current)
                .map(|e| e.target())
                .chain(self.graph.edges_directed(current, petgraph::Direction::Incoming).map(|e| e.source()))
                .collect();
            neighbors.sort_by_key(|&idx| self.graph[idx].name.clone());

            for next in neighbors {
                if depths.contains_key(&next) {
                    continue;
                }
                depths.insert(next, dist + 1);
                parents.insert(next, current);
                if next == goal {
                    let mut path = vec![goal];
                    let mut cur = goal;
                    while let Some(&p) = parents.get(&cur) {
                        path.push(p);
                        cur = p;
                    }
                    path.reverse();
                    return Ok(PathResult {
                        found: true,
                        nodes: path.into_iter().map(|idx| self.graph[idx].clone()).collect(),
                    });
                }
                queue.push_back(next);
            }
        }

        Ok(PathResult { found: false, nodes: vec![] })
    }

    #[instrument(skip(self))]
    pub fn get_impact_analysis(&self, repo_id: &str, name: &str, max_depth: u32) -> Result<ImpactAnalysis> {
        let start = self
            .find_node(repo_id, name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))?;

        let direct: Vec<NodeIndex> = self
            .graph
            .edges_directed(start, petgraph::Direction::Incoming)
            .filter(|e| e.weight().label == GraphEdgeLabel::Calls)
            .map(|e| e.source())
            .collect();

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        visited.insert(start);
        let mut transitive: Vec<NodeIndex> = Vec::new();
        let mut queue: VecDeque<(NodeIndex, u32)> = direct.iter().map(|&n| (n, 1)).collect();
        for &d in &direct {
            visited.insert(d);
        }

        while let Some((current, dist)) = queue.pop_front() {
            if current != start {
                transitive.push(current);
            }
            if dist >= max_depth {
                continue;
            }
            for e in self
                .graph
                .edges_directed(current, petgraph::Direction::Incoming)
                .filter(|e| e.weight().label == GraphEdgeLabel::Calls)
            {
                let caller = e.source();
                if visited.insert(caller) {
                    queue.push_back((caller, dist + 1));
                }
            }
        }

        let mut direct_callers: Vec<GraphNode> = direct.iter().map(|&i| self.graph[i].clone()).collect();
        direct_callers.sort_by(|a, b| a.name.cmp(&b.name));

        let mut transitive_callers: Vec<GraphNode> = transitive.iter().map(|&i| self.graph[i].clone()).collect();
        transitive_callers.sort_by(|a, b| a.name.cmp(&b.name));

        let mut affected_files: Vec<String> = direct_callers
            .iter()
            .chain(transitive_callers.iter())
            .filter_map(|n| n.file.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        affected_files.sort();

        Ok(ImpactAnalysis {
            direct_callers,
            transitive_callers,
            affected_files,
        })
    }

    pub fn nodes_for_repo(&self, repo_id: &str) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights().filter(move |n| n.repo_id == repo_id)
    }

    pub fn edges_for_repo(&self, repo_id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edge_weights().filter(move |e| e.repo_id == repo_id)
    }

    /// Removes every node/edge owned by `path` within `repo_id` (file or
    /// document tombstone). Used by the sync engine for hard deletions;
    /// archived documents use an upsert with a status flag instead (see
    /// `cv-sync`).
    #[instrument(skip(self))]
    pub fn remove_path(&mut self, repo_id: &str, path: &str) {
        let to_remove: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                let n = &self.graph[idx];
                n.repo_id == repo_id && n.file.as_deref() == Some(path)
            })
            .collect();
        for idx in to_remove {
            if let Some(node) = self.graph.remove_node(idx) {
                self.index.remove(&Self::key(&node.repo_id, &node.id));
            }
        }
    }

    // --- Persistence ---------------------------------------------------------

    pub fn save(&self, path: &Path) -> Result<()> {
        #[derive(serde::Serialize)]
        struct OnDisk<'a> {
            nodes: Vec<&'a GraphNode>,
            edges: Vec<&'a GraphEdge>,
        }
        let on_disk = OnDisk {
            nodes: self.graph.node_weights().collect(),
            edges: self.graph.edge_weights().collect(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&on_disk)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        #[derive(serde::Deserialize)]
        struct OnDisk {
            nodes: Vec<GraphNode>,
            edges: Vec<GraphEdge>,
        }
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = std::fs::read(path)?;
        let on_disk: OnDisk = serde_json::from_slice(&bytes)?;
        let mut store = Self::default();
        for node in on_disk.nodes {
            store.get_or_create_node(node);
        }
        for edge in on_disk.edges {
            let from = store.find_node(&edge.repo_id, &edge.from);
            let to = store.find_node(&edge.repo_id, &edge.to);
            if let (Some(from), Some(to)) = (from, to) {
                store.create_edge_idempotent(edge, from, to);
            }
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::model::{SymbolKind, Visibility};
    use cv_core::Timestamp;

    fn symbol(name: &str, file: &str) -> SymbolNode {
        SymbolNode {
            qualified_name: format!("{file}:{name}"),
            name: name.to_string(),
            kind: SymbolKind::Function,
            file: file.to_string(),
            start_line: 1,
            end_line: 2,
            signature: None,
            docstring: None,
            return_type: None,
            parameters: vec![],
            visibility: Visibility::Public,
            is_async: false,
            is_static: false,
            complexity: 1,
            calls: vec![],
            created_at: Timestamp::from_millis(0),
            updated_at: Timestamp::from_millis(0),
        }
    }

    #[test]
    fn neighborhood_depth_zero_returns_only_target() {
        let mut store = GraphStore::new();
        store.upsert_symbol_node("r1", &symbol("a", "a.rs"));
        let result = store.get_neighborhood("r1", "a.rs:a", 0, 100).unwrap();
        assert_eq!(result.nodes.len(), 1);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn neighborhood_orders_by_distance_then_name() {
        let mut store = GraphStore::new();
        store.upsert_symbol_node("r1", &symbol("A", "f.rs"));
        store.upsert_symbol_node("r1", &symbol("B", "f.rs"));
        store.upsert_symbol_node("r1", &symbol("C", "f.rs"));
        store.upsert_symbol_node("r1", &symbol("D", "f.rs"));
        store.create_calls_edge("r1", "f.rs:A", "f.rs:B", false, 1);
        store.create_calls_edge("r1", "f.rs:A", "f.rs:C", false, 1);
        store.create_calls_edge("r1", "f.rs:B", "f.rs:D", false, 1);

        let result = store.get_neighborhood("r1", "f.rs:A", 2, 100).unwrap();
        let names: Vec<&str> = result.nodes.iter().map(|n| n.node.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        assert_eq!(result.nodes[0].distance, 0);
        assert_eq!(result.nodes[1].distance, 1);
        assert_eq!(result.nodes[3].distance, 2);
    }

    #[test]
    fn upsert_is_commutative_under_identical_input() {
        let mut store = GraphStore::new();
        let s = symbol("a", "a.rs");
        store.upsert_symbol_node("r1", &s);
        store.upsert_symbol_node("r1", &s);
        assert_eq!(store.nodes_for_repo("r1").count(), 2); // symbol + file node
    }

    #[test]
    fn calls_edge_creates_placeholder_for_unresolved_callee() {
        let mut store = GraphStore::new();
        store.upsert_symbol_node("r1", &symbol("a", "a.rs"));
        store.create_calls_edge("r1", "a.rs:a", "external_fn", false, 5);
        let callees = store.get_callees("r1", "a.rs:a").unwrap();
        assert_eq!(callees.len(), 1);
        assert_eq!(callees[0].kind, NodeKind::Package);
    }

    #[test]
    fn repos_are_isolated() {
        let mut store = GraphStore::new();
        store.upsert_symbol_node("r1", &symbol("a", "a.rs"));
        store.upsert_symbol_node("r2", &symbol("a", "a.rs"));
        assert!(store.get_neighborhood("r2", "a.rs:a", 1, 10).is_ok());
        assert_eq!(store.nodes_for_repo("r1").count(), 2);
        assert_eq!(store.nodes_for_repo("r2").count(), 2);
    }
}
