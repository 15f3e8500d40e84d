//! Shared helpers used by every per-language extractor: complexity scoring,
//! call-site collection, doc-comment scraping, and chunk construction.
//!
//! Keeping these here instead of duplicating them six times over is the one
//! generalization this crate allows itself; everything else is deliberately
//! written out per language because the grammars disagree on field names
//! often enough that a fully generic walker would be harder to read than
//! six similar functions.

use cv_core::model::{CallSite, CodeChunk, SymbolKind, SymbolNode, Visibility};
use cv_core::{ids, Timestamp};
use std::sync::OnceLock;
use tree_sitter::Node;

const DEFAULT_CHUNK_LINES: usize = 50;

/// `1 + count of branching tokens` among `{if, else if, for, while, case,
/// catch, ?:, &&, ||}` (§4.1). A textual scan over the symbol's own source
/// span, not an AST walk — this is how the contract defines it.
pub fn complexity(text: &str) -> u32 {
    static KEYWORDS: OnceLock<regex::Regex> = OnceLock::new();
    let re = KEYWORDS.get_or_init(|| {
        regex::Regex::new(r"\b(if|else\s+if|elif|for|while|case|catch|except)\b").unwrap()
    });
    let mut score = 1u32;
    score += re.find_iter(text).count() as u32;
    score += text.matches("&&").count() as u32;
    score += text.matches("||").count() as u32;
    score += text.matches(" and ").count() as u32;
    score += text.matches(" or ").count() as u32;
    score += text.matches("?:").count() as u32;
    score
}

/// Builds a [`SymbolNode`] from a tree-sitter node plus the fields only the
/// caller's grammar knows how to extract (name, signature, parameters, ...).
#[allow(clippy::too_many_arguments)]
pub fn new_symbol(
    path: &str,
    owner: &[String],
    name: &str,
    kind: SymbolKind,
    node: Node,
    source: &[u8],
    signature: Option<String>,
    docstring: Option<String>,
    return_type: Option<String>,
    parameters: Vec<String>,
    visibility: Visibility,
    is_async: bool,
    is_static: bool,
    call_kinds: &[&str],
    conditional_kinds: &[&str],
    now: Timestamp,
) -> SymbolNode {
    let start_line = node.start_position().row + 1;
    let end_line = (node.end_position().row + 1).max(start_line);
    let text = node.utf8_text(source).unwrap_or_default();
    let calls = collect_calls(node, source, call_kinds, conditional_kinds);
    SymbolNode {
        qualified_name: ids::qualified_name(path, owner, name),
        name: name.to_string(),
        kind,
        file: path.to_string(),
        start_line,
        end_line,
        signature,
        docstring,
        return_type,
        parameters,
        visibility,
        is_async,
        is_static,
        complexity: complexity(text),
        calls,
        created_at: now,
        updated_at: now,
    }
}

/// Walks `node`'s subtree collecting every call expression whose kind is in
/// `call_kinds`. The innermost callee name is the last `.`/`::`-separated
/// segment of the callee expression's own text.
pub fn collect_calls(node: Node, source: &[u8], call_kinds: &[&str], conditional_kinds: &[&str]) -> Vec<CallSite> {
    let mut out = Vec::new();
    walk_calls(node, source, call_kinds, conditional_kinds, &mut out);
    out
}

fn walk_calls(node: Node, source: &[u8], call_kinds: &[&str], conditional_kinds: &[&str], out: &mut Vec<CallSite>) {
    if call_kinds.contains(&node.kind()) {
        if let Some(callee) = callee_name(node, source) {
            out.push(CallSite {
                callee,
                line: node.start_position().row + 1,
                is_conditional: has_conditional_ancestor(node, conditional_kinds),
            });
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_calls(child, source, call_kinds, conditional_kinds, out);
    }
}

fn callee_name(call_node: Node, source: &[u8]) -> Option<String> {
    let func = call_node
        .child_by_field_name("function")
        .or_else(|| call_node.child_by_field_name("macro"))
        .or_else(|| call_node.child(0))?;
    let text = func.utf8_text(source).ok()?.trim();
    let after_turbofish = text.split("::<").next().unwrap_or(text);
    let after_colons = after_turbofish.rsplit("::").next().unwrap_or(after_turbofish);
    let after_dot = after_colons.rsplit('.').next().unwrap_or(after_colons);
    let cleaned = after_dot.trim_end_matches('!').trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn has_conditional_ancestor(node: Node, conditional_kinds: &[&str]) -> bool {
    let mut cur = node.parent();
    while let Some(p) = cur {
        if conditional_kinds.contains(&p.kind()) {
            return true;
        }
        if matches!(p.kind(), "binary_expression" | "boolean_operator") && has_shortcircuit_operator(p) {
            return true;
        }
        cur = p.parent();
    }
    false
}

fn has_shortcircuit_operator(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| matches!(c.kind(), "&&" | "||" | "and" | "or"))
}

/// Contiguous run of comment lines immediately above `start_row` (0-indexed),
/// stripped of their leading comment marker and joined with spaces. Stops at
/// the first blank or non-comment line.
pub fn doc_comment_above(content: &str, start_row: usize, prefixes: &[&str]) -> Option<String> {
    let lines: Vec<&str> = content.lines().collect();
    if start_row == 0 {
        return None;
    }
    let mut collected = Vec::new();
    let mut i = start_row;
    while i > 0 {
        i -= 1;
        let line = match lines.get(i) {
            Some(l) => l.trim(),
            None => break,
        };
        if line.is_empty() {
            break;
        }
        match prefixes.iter().find(|p| line.starts_with(**p)) {
            Some(prefix) => collected.push(line.trim_start_matches(prefix).trim().to_string()),
            None => break,
        }
    }
    if collected.is_empty() {
        None
    } else {
        collected.reverse();
        Some(collected.join(" "))
    }
}

/// Leading string-literal expression statement inside a body, used as the
/// docstring for Python.
pub fn first_string_literal_text(body: Node, source: &[u8]) -> Option<String> {
    let mut cursor = body.walk();
    let first = body.named_children(&mut cursor).next()?;
    let expr = if first.kind() == "expression_statement" {
        first.named_child(0)?
    } else {
        first
    };
    if expr.kind() != "string" {
        return None;
    }
    let text = expr.utf8_text(source).ok()?;
    Some(
        text.trim_matches(|c| c == '"' || c == '\'')
            .trim()
            .to_string(),
    )
}

/// Direct-child text of a parameter list, one entry per named child,
/// excluding punctuation. Works for the common `(a, b: T, c = 1)` shapes
/// across the supported languages.
pub fn parameter_texts(params: Node, source: &[u8]) -> Vec<String> {
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter_map(|c| c.utf8_text(source).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn field_text<'a>(node: Node<'a>, field: &str, source: &'a [u8]) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(source).ok())
        .map(|s| s.to_string())
}

pub fn has_child_kind(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == kind)
}

/// One [`CodeChunk`] per top-level symbol when any were found; otherwise a
/// fixed-size chunking of the whole file (default 50 lines), per §4.1's
/// failure semantics and §8's zero-symbol boundary behavior.
pub fn build_chunks(path: &str, content: &str, language: &str, symbols: &[SymbolNode]) -> Vec<CodeChunk> {
    if symbols.is_empty() {
        fixed_size_chunks(path, content, language, DEFAULT_CHUNK_LINES)
    } else {
        symbol_chunks(path, content, language, symbols)
    }
}

pub fn fixed_size_chunks(path: &str, content: &str, language: &str, max_lines: usize) -> Vec<CodeChunk> {
    let max_lines = max_lines.max(1);
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }
    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < lines.len() {
        let end = (start + max_lines).min(lines.len());
        let start_line = start + 1;
        chunks.push(CodeChunk {
            id: ids::chunk_id(path, start_line),
            file: path.to_string(),
            start_line,
            end_line: end,
            text: lines[start..end].join("\n"),
            language: language.to_string(),
            symbol_name: None,
            symbol_kind: None,
        });
        start = end;
    }
    chunks
}

fn symbol_chunks(path: &str, content: &str, language: &str, symbols: &[SymbolNode]) -> Vec<CodeChunk> {
    let lines: Vec<&str> = content.lines().collect();
    symbols
        .iter()
        .map(|s| {
            let start = s.start_line.saturating_sub(1).min(lines.len());
            let end = s.end_line.min(lines.len()).max(start);
            let text = if start < end { lines[start..end].join("\n") } else { String::new() };
            CodeChunk {
                id: ids::chunk_id(path, s.start_line),
                file: path.to_string(),
                start_line: s.start_line,
                end_line: s.end_line,
                text,
                language: language.to_string(),
                symbol_name: Some(s.name.clone()),
                symbol_kind: Some(s.kind),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_counts_branch_keywords() {
        let text = "fn f() { if a {} }";
        assert_eq!(complexity(text), 2);
    }

    #[test]
    fn complexity_counts_shortcircuit_operators() {
        let text = "fn f() { a && b || c }";
        assert_eq!(complexity(text), 3);
    }

    #[test]
    fn doc_comment_stops_at_blank_line() {
        let content = "// a\n\n// b\nfn f() {}\n";
        assert_eq!(doc_comment_above(content, 3, &["//"]), None);
    }

    #[test]
    fn fixed_size_chunks_cover_whole_file() {
        let content = (0..120).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let chunks = fixed_size_chunks("f.rs", &content, "rust", 50);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].start_line, 101);
        assert_eq!(chunks[2].end_line, 120);
    }
}
