//! Python extractor: functions, methods (class-scoped), classes, module
//! level assignments, and imports, via `tree-sitter-python`.

use crate::common;
use cv_core::model::{Import, ImportType, ParsedFile, SymbolKind, SymbolNode, Visibility};
use cv_core::{Clock, SystemClock, Timestamp};
use tree_sitter::{Node, Parser};

const CALL_KINDS: &[&str] = &["call"];
const CONDITIONAL_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "else_clause",
    "conditional_expression",
    "except_clause",
    "boolean_operator",
];

pub fn parse(path: &str, content: &str) -> ParsedFile {
    let mut parser = Parser::new();
    if parser.set_language(&tree_sitter_python::LANGUAGE.into()).is_err() {
        return crate::fallback::parse(path, content, "python");
    }
    let Some(tree) = parser.parse(content, None) else {
        return crate::fallback::parse(path, content, "python");
    };
    let source = content.as_bytes();
    let now = SystemClock.now();

    let mut symbols = Vec::new();
    let mut imports = Vec::new();
    let mut owner = Vec::new();
    walk(tree.root_node(), source, content, path, &mut owner, &mut symbols, &mut imports, now);

    let chunks = common::build_chunks(path, content, "python", &symbols);
    ParsedFile {
        path: path.to_string(),
        language: "python".to_string(),
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
        "import_statement" | "import_from_statement" => {
            if let Ok(text) = node.utf8_text(source) {
                imports.push(parse_import(text, node.start_position().row + 1));
            }
            return;
        }
        "function_definition" => {
            if let Some(sym) = function_symbol(node, source, content, path, owner, now) {
                symbols.push(sym);
            }
            return;
        }
        "class_definition" => {
            if let Some(name) = common::field_text(node, "name", source) {
                let docstring = node
                    .child_by_field_name("body")
                    .and_then(|body| common::first_string_literal_text(body, source));
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
        "expression_statement" if owner.is_empty() => {
            if let Some(assign) = node.named_child(0) {
                if assign.kind() == "assignment" {
                    if let Some(name) = common::field_text(assign, "left", source) {
                        if name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                            let kind = if name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_numeric()) {
                                SymbolKind::Constant
                            } else {
                                SymbolKind::Variable
                            };
                            symbols.push(common::new_symbol(
                                path, owner, &name, kind, node, source, None, None, None, Vec::new(),
                                Visibility::Public, false, false, CALL_KINDS, CONDITIONAL_KINDS, now,
                            ));
                        }
                    }
                }
            }
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
    let is_async = common::has_child_kind(node, "async");
    let visibility = if name.starts_with('_') { Visibility::Private } else { Visibility::Public };
    let docstring = node
        .child_by_field_name("body")
        .and_then(|body| common::first_string_literal_text(body, source))
        .or_else(|| common::doc_comment_above(content, node.start_position().row, &["#"]));
    let signature = node.utf8_text(source).ok().map(|s| {
        s.lines().next().unwrap_or(s).trim_end_matches(':').to_string()
    });

    Some(common::new_symbol(
        path, owner, &name, kind, node, source, signature, docstring, return_type, parameters,
        visibility, is_async, false, CALL_KINDS, CONDITIONAL_KINDS, now,
    ))
}

fn parse_import(text: &str, line: usize) -> Import {
    let trimmed = text.trim().trim_end_matches(|c: char| c == '\n');
    if let Some(rest) = trimmed.strip_prefix("from ") {
        let mut parts = rest.splitn(2, " import ");
        let module = parts.next().unwrap_or("").trim().to_string();
        let names = parts.next().unwrap_or("").trim();
        let imported_symbols: Vec<String> = names
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let is_external = !module.starts_with('.');
        Import {
            source: module.clone(),
            imported_symbols,
            import_type: ImportType::Named,
            is_external,
            package_name: Some(module.split('.').next().unwrap_or("").to_string()),
            line,
        }
    } else {
        let module = trimmed.trim_start_matches("import ").trim().to_string();
        let package_name = module.split(',').next().unwrap_or(&module).split('.').next().unwrap_or("").trim().to_string();
        Import {
            source: module.clone(),
            imported_symbols: vec![module.split('.').next_back().unwrap_or(&module).to_string()],
            import_type: ImportType::Default,
            is_external: true,
            package_name: Some(package_name),
            line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_and_class_method() {
        let src = "class Foo:\n    def bar(self):\n        return 1\n\ndef top():\n    pass\n";
        let pf = parse("foo.py", src);
        let bar = pf.symbols.iter().find(|s| s.name == "bar").unwrap();
        assert_eq!(bar.kind, SymbolKind::Method);
        let top = pf.symbols.iter().find(|s| s.name == "top").unwrap();
        assert_eq!(top.kind, SymbolKind::Function);
    }

    #[test]
    fn constant_naming_convention_detected() {
        let pf = parse("foo.py", "MAX_SIZE = 10\n");
        let sym = pf.symbols.iter().find(|s| s.name == "MAX_SIZE").unwrap();
        assert_eq!(sym.kind, SymbolKind::Constant);
    }
}
