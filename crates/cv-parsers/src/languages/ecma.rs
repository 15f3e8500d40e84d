//! Shared walker for the two ECMAScript-family grammars (`javascript` and
//! `typescript`), which agree on enough node kinds that duplicating the
//! walk itself would just be more dart-stub-shaped drift than sharing it.
//! `typescript.rs` and `javascript.rs` are the thin per-grammar entry
//! points; this module holds the one walk they both run.

use crate::common;
use cv_core::model::{Import, ImportType, ParsedFile, SymbolKind, SymbolNode, Visibility};
use cv_core::{Clock, SystemClock, Timestamp};
use tree_sitter::{Language, Node, Parser};

const CALL_KINDS: &[&str] = &["call_expression"];
const CONDITIONAL_KINDS: &[&str] = &[
    "if_statement",
    "else_clause",
    "ternary_expression",
    "switch_case",
    "catch_clause",
];

pub fn parse(path: &str, content: &str, language: Language, tag: &'static str) -> ParsedFile {
    let mut parser = Parser::new();
    if parser.set_language(&language).is_err() {
        return crate::fallback::parse(path, content, tag);
    }
    let Some(tree) = parser.parse(content, None) else {
        return crate::fallback::parse(path, content, tag);
    };
    let source = content.as_bytes();
    let now = SystemClock.now();

    let mut symbols = Vec::new();
    let mut imports = Vec::new();
    let mut owner = Vec::new();
    walk(tree.root_node(), source, content, path, &mut owner, &mut symbols, &mut imports, now);

    let chunks = common::build_chunks(path, content, tag, &symbols);
    ParsedFile {
        path: path.to_string(),
        language: tag.to_string(),
        content: content.to_string(),
        symbols,
        imports,
        exports: Vec::new(),
        chunks,
    }
}

#[allow(clippy::too_many_arguments)]
fn walk(
    node: Node,
    source: &[u8],
    content: &str,
    path: &str,
    owner: &mut Vec<String>,
    symbols: &mut Vec<SymbolNode>,
    imports: &mut Vec<Import>,
    now: Timestamp,
) {
    match node.kind() {
        "import_statement" => {
            if let Ok(text) = node.utf8_text(source) {
                imports.push(parse_import(text, node.start_position().row + 1));
            }
            return;
        }
        "function_declaration" | "generator_function_declaration" => {
            if let Some(sym) = function_symbol(node, source, content, path, owner, now) {
                symbols.push(sym);
            }
            return;
        }
        "method_definition" => {
            if let Some(sym) = function_symbol(node, source, content, path, owner, now) {
                symbols.push(sym);
            }
            return;
        }
        "class_declaration" => {
            if let Some(name) = common::field_text(node, "name", source) {
                let docstring = common::doc_comment_above(content, node.start_position().row, &["//", "*", "/**"]);
                symbols.push(common::new_symbol(
                    path, owner, &name, SymbolKind::Class, node, source,
                    Some(format!("class {name}")), docstring, None, Vec::new(),
                    Visibility::Public, false, false, CALL_KINDS, CONDITIONAL_KINDS, now,
                ));
                owner.push(name);
                descend(node, source, content, path, owner, symbols, imports, now);
                owner.pop();
            }
            return;
        }
        "interface_declaration" => {
            if let Some(name) = common::field_text(node, "name", source) {
                symbols.push(common::new_symbol(
                    path, owner, &name, SymbolKind::Interface, node, source,
                    Some(format!("interface {name}")), None, None, Vec::new(),
                    Visibility::Public, false, false, CALL_KINDS, CONDITIONAL_KINDS, now,
                ));
            }
            return;
        }
        "type_alias_declaration" => {
            if let Some(name) = common::field_text(node, "name", source) {
                symbols.push(common::new_symbol(
                    path, owner, &name, SymbolKind::Type, node, source,
                    Some(format!("type {name}")), None, None, Vec::new(),
                    Visibility::Public, false, false, CALL_KINDS, CONDITIONAL_KINDS, now,
                ));
            }
            return;
        }
        "lexical_declaration" | "variable_declaration" if owner.is_empty() => {
            top_level_declarators(node, source, content, path, owner, symbols, now);
            return;
        }
        _ => {}
    }
    descend(node, source, content, path, owner, symbols, imports, now);
}

#[allow(clippy::too_many_arguments)]
fn descend(
    node: Node,
    source: &[u8],
    content: &str,
    path: &str,
    owner: &mut Vec<String>,
    symbols: &mut Vec<SymbolNode>,
    imports: &mut Vec<Import>,
    now: Timestamp,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, content, path, owner, symbols, imports, now);
    }
}

fn top_level_declarators(node: Node, source: &[u8], content: &str, path: &str, owner: &[String], symbols: &mut Vec<SymbolNode>, now: Timestamp) {
    let is_const = node
        .child(0)
        .and_then(|c| c.utf8_text(source).ok())
        .map(|s| s == "const")
        .unwrap_or(false);
    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor).filter(|c| c.kind() == "variable_declarator") {
        let Some(name) = common::field_text(declarator, "name", source) else { continue };
        let value_kind = declarator.child_by_field_name("value").map(|v| v.kind());
        if matches!(value_kind, Some("arrow_function") | Some("function_expression")) {
            let value = declarator.child_by_field_name("value").unwrap();
            let parameters = value
                .child_by_field_name("parameters")
                .or_else(|| value.child_by_field_name("parameter"))
                .map(|p| common::parameter_texts(p, source))
                .unwrap_or_default();
            let is_async = common::has_child_kind(value, "async");
            let docstring = common::doc_comment_above(content, node.start_position().row, &["//", "*", "/**"]);
            symbols.push(common::new_symbol(
                path, owner, &name, SymbolKind::Function, node, source,
                Some(format!("const {name} = ...")), docstring, None, parameters,
                Visibility::Public, is_async, false, CALL_KINDS, CONDITIONAL_KINDS, now,
            ));
        } else {
            let kind = if is_const { SymbolKind::Constant } else { SymbolKind::Variable };
            symbols.push(common::new_symbol(
                path, owner, &name, kind, node, source, None, None, None, Vec::new(),
                Visibility::Public, false, false, CALL_KINDS, CONDITIONAL_KINDS, now,
            ));
        }
    }
}

fn function_symbol(node: Node, source: &[u8], content: &str, path: &str, owner: &[String], now: Timestamp) -> Option<SymbolNode> {
    let name = common::field_text(node, "name", source)?;
    let kind = if node.kind() == "method_definition" || !owner.is_empty() { SymbolKind::Method } else { SymbolKind::Function };
    let parameters = node
        .child_by_field_name("parameters")
        .map(|p| common::parameter_texts(p, source))
        .unwrap_or_default();
    let return_type = common::field_text(node, "return_type", source);
    let is_async = common::has_child_kind(node, "async");
    let is_static = common::has_child_kind(node, "static");
    let visibility = if name.starts_with('#') || name.starts_with('_') { Visibility::Private } else { Visibility::Public };
    let docstring = common::doc_comment_above(content, node.start_position().row, &["//", "*", "/**"]);
    let signature = node
        .child_by_field_name("body")
        .and_then(|body| node.utf8_text(source).ok().map(|t| t[..(body.start_byte() - node.start_byte()).min(t.len())].trim().to_string()))
        .or_else(|| node.utf8_text(source).ok().map(|s| s.lines().next().unwrap_or(s).to_string()));

    Some(common::new_symbol(
        path, owner, &name, kind, node, source, signature, docstring, return_type, parameters,
        visibility, is_async, is_static, CALL_KINDS, CONDITIONAL_KINDS, now,
    ))
}

fn parse_import(text: &str, line: usize) -> Import {
    let trimmed = text.trim().trim_end_matches(';').trim();
    let is_external = !trimmed.contains("from \".") && !trimmed.contains("from '.");
    let source_path = trimmed
        .rsplit(|c| c == '\'' || c == '"')
        .nth(1)
        .unwrap_or("")
        .to_string();
    let import_type = if trimmed.contains("* as") {
        ImportType::Namespace
    } else if trimmed.starts_with("import {") || trimmed.contains(", {") {
        ImportType::Named
    } else if trimmed.starts_with("import \"") || trimmed.starts_with("import '") {
        ImportType::SideEffect
    } else {
        ImportType::Default
    };
    let imported_symbols = if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.find('}')) {
        trimmed[start + 1..end].split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    } else {
        trimmed
            .trim_start_matches("import")
            .trim()
            .split(" from ")
            .next()
            .map(|s| vec![s.trim().to_string()])
            .unwrap_or_default()
    };
    let package_name = if is_external {
        Some(source_path.split('/').next().unwrap_or(&source_path).to_string())
    } else {
        None
    };
    Import {
        source: source_path,
        imported_symbols,
        import_type,
        is_external,
        package_name,
        line,
    }
}
