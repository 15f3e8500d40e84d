//! Shared data model for parsed source, graph entities, and vector payloads.
//!
//! This is the one schema every crate in the workspace speaks: `cv-parsers`
//! produces it, `cv-graph`/`cv-vector` persist it, `cv-sync` orchestrates its
//! flow, and `cv-semantic`/`cv-summary` read it back out.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::time::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Type,
    Variable,
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub callee: String,
    pub line: usize,
    pub is_conditional: bool,
}

/// A named source entity. `qualified_name` is the stable key used by the
/// graph store and is derived via [`crate::ids::qualified_name`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolNode {
    pub qualified_name: String,
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub return_type: Option<String>,
    pub parameters: Vec<String>,
    pub visibility: Visibility,
    pub is_async: bool,
    pub is_static: bool,
    /// Cyclomatic-style count: 1 + branching tokens in the symbol's body.
    pub complexity: u32,
    pub calls: Vec<CallSite>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SymbolNode {
    /// `startLine <= endLine` is a standing invariant; callers that can't
    /// uphold it (malformed fallback-parser spans) should clamp before
    /// constructing this type rather than store an inconsistent node.
    pub fn is_well_formed(&self) -> bool {
        self.start_line <= self.end_line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportType {
    Default,
    Named,
    Namespace,
    SideEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub source: String,
    pub imported_symbols: Vec<String>,
    pub import_type: ImportType,
    pub is_external: bool,
    pub package_name: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportType {
    Default,
    Named,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub name: String,
    pub export_type: ExportType,
    pub line: usize,
}

/// A contiguous, embeddable range of a source file.
///
/// `id` is always `"{file}:{start_line}"` (see [`crate::ids::chunk_id`]); two
/// chunks with the same id are the same chunk by definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeChunk {
    pub id: String,
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    pub language: String,
    pub symbol_name: Option<String>,
    pub symbol_kind: Option<SymbolKind>,
}

/// Output of [P]: a single file, fully parsed. Owns its symbols, imports,
/// exports, and chunks for the lifetime of one sync; downstream stores copy
/// out of it and it is then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub path: String,
    pub language: String,
    pub content: String,
    pub symbols: Vec<SymbolNode>,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub chunks: Vec<CodeChunk>,
}

// --- Markdown / documentation model -----------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocFrontmatter {
    pub doc_type: Option<String>,
    pub status: Option<String>,
    pub tags: Vec<String>,
    pub relates_to: Vec<String>,
    pub priority: Option<String>,
    pub author: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub custom_fields: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub line: usize,
    pub anchor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocLink {
    pub text: String,
    pub target: String,
    pub line: usize,
    pub is_internal: bool,
    pub is_code_ref: bool,
}

/// A markdown sub-unit delimited by the configured heading level.
/// `id = "doc:{file}:{start_line}-{end_line}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocSection {
    pub id: String,
    pub heading: Option<String>,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub links: Vec<DocLink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Readme,
    Changelog,
    Adr,
    Roadmap,
    SessionNotes,
    PhaseDoc,
    ApiDoc,
    ReleaseNote,
    Guide,
    Tutorial,
    Reference,
    DesignSpec,
    TechnicalSpec,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub path: String,
    pub frontmatter: DocFrontmatter,
    pub headings: Vec<Heading>,
    pub links: Vec<DocLink>,
    pub sections: Vec<DocSection>,
    pub inferred_type: DocumentType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    pub document_type: DocumentType,
    pub tags: Vec<String>,
}

// --- Graph model --------------------------------------------------------

/// Edge label, shared by `cv-graph`'s upsert API and `cv-sync`'s writers.
/// Traversal priority (highest first) is INHERITS > CALLS > IMPORTS >
/// REFERENCES_DOC > DESCRIBES; see [`GraphEdgeLabel::traversal_priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraphEdgeLabel {
    Calls,
    Imports,
    DefinedIn,
    Describes,
    ReferencesDoc,
    Inherits,
}

impl GraphEdgeLabel {
    pub fn traversal_priority(&self) -> u8 {
        match self {
            GraphEdgeLabel::Inherits => 0,
            GraphEdgeLabel::Calls => 1,
            GraphEdgeLabel::Imports => 2,
            GraphEdgeLabel::ReferencesDoc => 3,
            GraphEdgeLabel::Describes => 4,
            GraphEdgeLabel::DefinedIn => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Symbol,
    File,
    Document,
    Package,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub file: Option<String>,
    pub repo_id: String,
    /// Lifecycle marker for document nodes, e.g. `"archived"`. `None` for
    /// every other node kind and for documents that are still live.
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub label: GraphEdgeLabel,
    pub from: String,
    pub to: String,
    pub repo_id: String,
    pub is_conditional: Option<bool>,
    pub line: Option<usize>,
}

// --- Hierarchical summaries ----------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLevel {
    Symbol = 1,
    File = 2,
    Directory = 3,
    Repo = 4,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalSummaryPayload {
    pub id: String,
    pub level: SummaryLevel,
    pub path: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub summary: String,
    pub keywords: Vec<String>,
    pub content_hash: String,
    pub symbol_kind: Option<SymbolKind>,
    pub symbol_count: Option<usize>,
    pub file_count: Option<usize>,
    pub languages: Vec<String>,
    pub last_modified: Timestamp,
}

// --- Vector store payload envelope ---------------------------------------

/// Tagged union of everything stored in a vector collection. Unknown fields
/// coming back from the backend are kept in `extra` rather than dropped, per
/// the "dynamic, untyped payloads" design note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VectorPayload {
    CodeChunk {
        #[serde(flatten)]
        chunk: CodeChunk,
        #[serde(flatten)]
        extra: HashMap<String, serde_json::Value>,
    },
    DocumentChunk {
        #[serde(flatten)]
        chunk: DocumentChunk,
        #[serde(flatten)]
        extra: HashMap<String, serde_json::Value>,
    },
    Summary {
        #[serde(flatten)]
        summary: HierarchicalSummaryPayload,
        #[serde(flatten)]
        extra: HashMap<String, serde_json::Value>,
    },
}

impl VectorPayload {
    pub fn id(&self) -> &str {
        match self {
            VectorPayload::CodeChunk { chunk, .. } => &chunk.id,
            VectorPayload::DocumentChunk { chunk, .. } => &chunk.id,
            VectorPayload::Summary { summary, .. } => &summary.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_priority_orders_inherits_before_describes() {
        assert!(GraphEdgeLabel::Inherits.traversal_priority() < GraphEdgeLabel::Calls.traversal_priority());
        assert!(GraphEdgeLabel::Calls.traversal_priority() < GraphEdgeLabel::Imports.traversal_priority());
        assert!(GraphEdgeLabel::ReferencesDoc.traversal_priority() < GraphEdgeLabel::Describes.traversal_priority());
    }

    #[test]
    fn symbol_well_formed_checks_line_ordering() {
        let base = SymbolNode {
            qualified_name: "a.rs:foo".into(),
            name: "foo".into(),
            kind: SymbolKind::Function,
            file: "a.rs".into(),
            start_line: 10,
            end_line: 5,
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
        };
        assert!(!base.is_well_formed());
    }
}
