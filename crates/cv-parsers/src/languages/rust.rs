//! Rust extractor: functions, methods (`impl`-scoped), structs/enums,
//! traits, consts/statics, and `use` imports, via `tree-sitter-rust`.

use crate::common;
use cv_core::model::{Import, ImportType, ParsedFile, SymbolKind, SymbolNode, Visibility};
use cv_core::{Clock, SystemClock, Timestamp};
use tree_sitter::{Node, Parser};

const CALL_KINDS: &[&str] = &["call_expression", "macro_invocation"];
const CONDITIONAL_KINDS: &[&str] = &[
    "if_expression",
    "if_let_expression",
    "match_arm",
    "else_clause",
];

pub fn parse(path: &str, content: &str) -> ParsedFile {
    let mut parser = Parser::new();
    if parser.set_language(&tree_sitter_rust::LANGUAGE.into()).is_err() {
        return crate::fallback::parse(path, content, "rust");
    }
    let Some(tree) = parser.parse(content, None) else {
        return crate::fallback::parse(path, content, "rust");
    };
    let source = content.as_bytes();
    let now = SystemClock.now();

    let mut symbols = Vec::new();
    let mut imports = Vec::new();
    let mut owner = Vec::new();
    walk(tree.root_node(), source, content, path, &mut owner, &mut symbols, &mut imports, now);

    let chunks = common::build_chunks(path, content, "rust", &symbols);
    ParsedFile {
        path: path.to_string(),
        language: "rust".to_string(),
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
        "use_declaration" => {
            if let Ok(text) = node.utf8_text(source) {
                imports.push(parse_use(text, node.start_position().row + 1));
            }
            return;
        }
        "function_item" => {
            if let Some(sym) = function_symbol(node, source, content, path, owner, now) {
                symbols.push(sym);
            }
            return;
        }
        "struct_item" | "enum_item" => {
            if let Some(name) = common::field_text(node, "name", source) {
                symbols.push(type_symbol(node, source, content, path, owner, &name, SymbolKind::Class, now));
            }
            return;
        }
        "trait_item" => {
            if let Some(name) = common::field_text(node, "name", source) {
                symbols.push(type_symbol(node, source, content, path, owner, &name, SymbolKind::Interface, now));
                owner.push(name);
                descend(node, source, content, path, owner, symbols, imports, now);
                owner.pop();
            }
            return;
        }
        "impl_item" => {
            let ty = node
                .child_by_field_name("type")
                .and_then(|n| n.utf8_text(source).ok())
                .unwrap_or("impl");
            owner.push(ty.to_string());
            descend(node, source, content, path, owner, symbols, imports, now);
            owner.pop();
            return;
        }
        "mod_item" => {
            if let Some(name) = common::field_text(node, "name", source) {
                owner.push(name);
                descend(node, source, content, path, owner, symbols, imports, now);
                owner.pop();
                return;
            }
        }
        "const_item" | "static_item" => {
            if let Some(name) = common::field_text(node, "name", source) {
                let kind = if node.kind() == "const_item" { SymbolKind::Constant } else { SymbolKind::Variable };
                symbols.push(type_symbol(node, source, content, path, owner, &name, kind, now));
            }
            return;
        }
        "type_item" => {
            if let Some(name) = common::field_text(node, "name", source) {
                symbols.push(type_symbol(node, source, content, path, owner, &name, SymbolKind::Type, now));
            }
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

fn function_symbol(node: Node, source: &[u8], content: &str, path: &str, owner: &[String], now: Timestamp) -> Option<SymbolNode> {
    let name = common::field_text(node, "name", source)?;
    let kind = if owner.is_empty() { SymbolKind::Function } else { SymbolKind::Method };
    let parameters = node
        .child_by_field_name("parameters")
        .map(|p| common::parameter_texts(p, source))
        .unwrap_or_default();
    let return_type = common::field_text(node, "return_type", source);
    let visibility = if common::has_child_kind(node, "visibility_modifier") {
        Visibility::Public
    } else {
        Visibility::Private
    };
    let is_async = common::has_child_kind(node, "async");
    let signature = node
        .child_by_field_name("body")
        .and_then(|body| node.utf8_text(source).ok().map(|t| t[..body.start_byte() - node.start_byte()].trim().to_string()))
        .or_else(|| node.utf8_text(source).ok().map(|s| s.lines().next().unwrap_or(s).to_string()));
    let docstring = common::doc_comment_above(content, node.start_position().row, &["///", "//!"]);

    Some(common::new_symbol(
        path, owner, &name, kind, node, source, signature, docstring, return_type, parameters,
        visibility, is_async, false, CALL_KINDS, CONDITIONAL_KINDS, now,
    ))
}

#[allow(clippy::too_many_arguments)]
fn type_symbol(
    node: Node,
    source: &[u8],
    content: &str,
    path: &str,
    owner: &[String],
    name: &str,
    kind: SymbolKind,
    now: Timestamp,
) -> SymbolNode {
    let visibility = if common::has_child_kind(node, "visibility_modifier") {
        Visibility::Public
    } else {
        Visibility::Private
    };
    let docstring = common::doc_comment_above(content, node.start_position().row, &["///", "//!"]);
    let signature = node.utf8_text(source).ok().map(|s| s.lines().next().unwrap_or(s).to_string());
    common::new_symbol(
        path, owner, name, kind, node, source, signature, docstring, None, Vec::new(),
        visibility, false, node.kind() == "static_item", CALL_KINDS, CONDITIONAL_KINDS, now,
    )
}

fn parse_use(text: &str, line: usize) -> Import {
    let body = text.trim().trim_start_matches("pub").trim().trim_start_matches("use").trim().trim_end_matches(';').trim();
    let is_external = !body.starts_with("crate::") && !body.starts_with("self::") && !body.starts_with("super::");
    let package_name = body.split("::").next().map(|s| s.to_string());
    let import_type = if body.contains('*') {
        ImportType::Namespace
    } else if body.contains('{') {
        ImportType::Named
    } else {
        ImportType::Default
    };
    let imported_symbols = if let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) {
        body[start + 1..end].split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    } else {
        body.rsplit("::").next().map(|s| vec![s.to_string()]).unwrap_or_default()
    };
    Import {
        source: body.to_string(),
        imported_symbols,
        import_type,
        is_external,
        package_name,
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_top_level_function() {
        let pf = parse("lib.rs", "pub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n");
        assert_eq!(pf.symbols.len(), 1);
        let s = &pf.symbols[0];
        assert_eq!(s.name, "add");
        assert_eq!(s.kind, SymbolKind::Function);
        assert_eq!(s.visibility, Visibility::Public);
        assert!(s.start_line <= s.end_line);
    }

    #[test]
    fn extracts_impl_scoped_method_as_method_kind() {
        let pf = parse("lib.rs", "struct Foo;\nimpl Foo {\n    fn bar(&self) {}\n}\n");
        let bar = pf.symbols.iter().find(|s| s.name == "bar").unwrap();
        assert_eq!(bar.kind, SymbolKind::Method);
        assert!(bar.qualified_name.contains("Foo.bar"));
    }

    #[test]
    fn detects_conditional_calls() {
        let pf = parse("lib.rs", "fn f() {\n    if true {\n        g();\n    }\n    h();\n}\n");
        let f = pf.symbols.iter().find(|s| s.name == "f").unwrap();
        let g = f.calls.iter().find(|c| c.callee == "g").unwrap();
        let h = f.calls.iter().find(|c| c.callee == "h").unwrap();
        assert!(g.is_conditional);
        assert!(!h.is_conditional);
    }
}
