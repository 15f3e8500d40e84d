//! Java extractor: methods, classes, interfaces, and fields, via
//! `tree-sitter-java`. Modifiers (visibility, `static`) are read textually
//! from the span preceding the declaration's name rather than through a
//! `modifiers` field, since the grammar nests them under an anonymous
//! child whose exact shape isn't worth depending on here.

use crate::common;
use cv_core::model::{Import, ImportType, ParsedFile, SymbolKind, SymbolNode, Visibility};
use cv_core::{Clock, SystemClock, Timestamp};
use tree_sitter::{Node, Parser};

const CALL_KINDS: &[&str] = &["method_invocation", "object_creation_expression"];
const CONDITIONAL_KINDS: &[&str] = &[
    "if_statement",
    "switch_expression",
    "catch_clause",
    "ternary_expression",
];

pub fn parse(path: &str, content: &str) -> ParsedFile {
    let mut parser = Parser::new();
    if parser.set_language(&tree_sitter_java::LANGUAGE.into()).is_err() {
        return crate::fallback::parse(path, content, "java");
    }
    let Some(tree) = parser.parse(content, None) else {
        return crate::fallback::parse(path, content, "java");
    };
    let source = content.as_bytes();
    let now = SystemClock.now();

    let mut symbols = Vec::new();
    let mut imports = Vec::new();
    let mut owner = Vec::new();
    walk(tree.root_node(), source, content, path, &mut owner, &mut symbols, &mut imports, now);

    let chunks = common::build_chunks(path, content, "java", &symbols);
    ParsedFile {
        path: path.to_string(),
        language: "java".to_string(),
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
        "import_declaration" => {
            if let Ok(text) = node.utf8_text(source) {
                imports.push(parse_import(text, node.start_position().row + 1));
            }
            return;
        }
        "method_declaration" | "constructor_declaration" => {
            if let Some(sym) = method_symbol(node, source, content, path, owner, now) {
                symbols.push(sym);
            }
            return;
        }
        "class_declaration" | "interface_declaration" | "enum_declaration" | "record_declaration" => {
            if let Some(name) = common::field_text(node, "name", source) {
                let kind = if node.kind() == "interface_declaration" { SymbolKind::Interface } else { SymbolKind::Class };
                let docstring = common::doc_comment_above(content, node.start_position().row, &["//", "*", "/**"]);
                let visibility = visibility_from_modifiers(node, source);
                symbols.push(common::new_symbol(
                    path, owner, &name, kind, node, source,
                    Some(format!("{} {name}", node.kind().trim_end_matches("_declaration"))),
                    docstring, None, Vec::new(), visibility, false, false, CALL_KINDS, CONDITIONAL_KINDS, now,
                ));
                owner.push(name);
                descend(node, source, content, path, owner, symbols, imports, now);
                owner.pop();
            }
            return;
        }
        "field_declaration" => {
            collect_fields(node, source, path, owner, symbols, now);
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

fn modifiers_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    let end = node
        .child_by_field_name("name")
        .map(|n| n.start_byte())
        .unwrap_or(node.end_byte());
    let start = node.start_byte();
    if end < start {
        return "";
    }
    std::str::from_utf8(&source[start..end]).unwrap_or("")
}

fn visibility_from_modifiers(node: Node, source: &[u8]) -> Visibility {
    let text = modifiers_text(node, source);
    if text.contains("private") {
        Visibility::Private
    } else if text.contains("protected") {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

fn method_symbol(node: Node, source: &[u8], content: &str, path: &str, owner: &[String], now: Timestamp) -> Option<SymbolNode> {
    let name = common::field_text(node, "name", source)?;
    let parameters = node
        .child_by_field_name("parameters")
        .map(|p| common::parameter_texts(p, source))
        .unwrap_or_default();
    let return_type = common::field_text(node, "type", source);
    let modifiers = modifiers_text(node, source);
    let visibility = visibility_from_modifiers(node, source);
    let is_static = modifiers.contains("static");
    let docstring = common::doc_comment_above(content, node.start_position().row, &["//", "*", "/**"]);
    let signature = node
        .child_by_field_name("body")
        .and_then(|body| node.utf8_text(source).ok().map(|t| t[..(body.start_byte() - node.start_byte()).min(t.len())].trim().to_string()))
        .or_else(|| node.utf8_text(source).ok().map(|s| s.lines().next().unwrap_or(s).to_string()));

    Some(common::new_symbol(
        path, owner, &name, SymbolKind::Method, node, source, signature, docstring, return_type, parameters,
        visibility, false, is_static, CALL_KINDS, CONDITIONAL_KINDS, now,
    ))
}

fn collect_fields(node: Node, source: &[u8], path: &str, owner: &[String], symbols: &mut Vec<SymbolNode>, now: Timestamp) {
    let modifiers = modifiers_text(node, source);
    let visibility = if modifiers.contains("private") {
        Visibility::Private
    } else if modifiers.contains("protected") {
        Visibility::Protected
    } else {
        Visibility::Public
    };
    let kind = if modifiers.contains("final") { SymbolKind::Constant } else { SymbolKind::Variable };
    let is_static = modifiers.contains("static");
    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor).filter(|c| c.kind() == "variable_declarator") {
        let Some(name) = common::field_text(declarator, "name", source) else { continue };
        symbols.push(common::new_symbol(
            path, owner, &name, kind, declarator, source, None, None, None, Vec::new(),
            visibility, false, is_static, CALL_KINDS, CONDITIONAL_KINDS, now,
        ));
    }
}

fn parse_import(text: &str, line: usize) -> Import {
    let body = text.trim().trim_start_matches("import").trim().trim_start_matches("static").trim().trim_end_matches(';').trim();
    let is_wildcard = body.ends_with(".*");
    let package_name = body.trim_end_matches(".*").to_string();
    let imported_symbols = if is_wildcard {
        Vec::new()
    } else {
        vec![body.rsplit('.').next().unwrap_or(body).to_string()]
    };
    Import {
        source: body.to_string(),
        imported_symbols,
        import_type: if is_wildcard { ImportType::Namespace } else { ImportType::Default },
        is_external: !body.starts_with("java.lang"),
        package_name: Some(package_name),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_class_and_method_visibility() {
        let pf = parse(
            "Foo.java",
            "public class Foo {\n    private int count;\n    public int bar() {\n        return count;\n    }\n}\n",
        );
        let foo = pf.symbols.iter().find(|s| s.name == "Foo").unwrap();
        assert_eq!(foo.kind, SymbolKind::Class);
        let bar = pf.symbols.iter().find(|s| s.name == "bar").unwrap();
        assert_eq!(bar.visibility, Visibility::Public);
        assert!(bar.qualified_name.contains("Foo.bar"));
        let count = pf.symbols.iter().find(|s| s.name == "count").unwrap();
        assert_eq!(count.visibility, Visibility::Private);
    }
}
