//! Go extractor: functions, receiver methods, struct/interface type
//! declarations, const/var specs, and imports, via `tree-sitter-go`.

use crate::common;
use cv_core::model::{Import, ImportType, ParsedFile, SymbolKind, SymbolNode, Visibility};
use cv_core::{Clock, SystemClock, Timestamp};
use tree_sitter::{Node, Parser};

const CALL_KINDS: &[&str] = &["call_expression"];
const CONDITIONAL_KINDS: &[&str] = &[
    "if_statement",
    "expression_switch_statement",
    "type_switch_statement",
    "select_statement",
];

pub fn parse(path: &str, content: &str) -> ParsedFile {
    let mut parser = Parser::new();
    if parser.set_language(&tree_sitter_go::LANGUAGE.into()).is_err() {
        return crate::fallback::parse(path, content, "go");
    }
    let Some(tree) = parser.parse(content, None) else {
        return crate::fallback::parse(path, content, "go");
    };
    let source = content.as_bytes();
    let now = SystemClock.now();

    let mut symbols = Vec::new();
    let mut imports = Vec::new();
    walk(tree.root_node(), source, content, path, &mut symbols, &mut imports, now);

    let chunks = common::build_chunks(path, content, "go", &symbols);
    ParsedFile {
        path: path.to_string(),
        language: "go".to_string(),
        content: content.to_string(),
        symbols,
        imports,
        exports: Vec::new(),
        chunks,
    }
}

fn walk(node: Node, source: &[u8], content: &str, path: &str, symbols: &mut Vec<SymbolNode>, imports: &mut Vec<Import>, now: Timestamp) {
    match node.kind() {
        "import_declaration" => {
            collect_imports(node, source, imports);
            return;
        }
        "function_declaration" => {
            if let Some(sym) = function_symbol(node, source, content, path, &[], now) {
                symbols.push(sym);
            }
            return;
        }
        "method_declaration" => {
            let owner = receiver_type(node, source).into_iter().collect::<Vec<_>>();
            if let Some(sym) = function_symbol(node, source, content, path, &owner, now) {
                symbols.push(sym);
            }
            return;
        }
        "type_declaration" => {
            let mut cursor = node.walk();
            for spec in node.named_children(&mut cursor).filter(|c| c.kind() == "type_spec") {
                if let Some(sym) = type_symbol(spec, source, content, path, now) {
                    symbols.push(sym);
                }
            }
            return;
        }
        "const_declaration" | "var_declaration" => {
            let kind = if node.kind() == "const_declaration" { SymbolKind::Constant } else { SymbolKind::Variable };
            collect_specs(node, source, path, kind, symbols, now);
            return;
        }
        _ => {}
    }
    descend(node, source, content, path, symbols, imports, now);
}

fn descend(node: Node, source: &[u8], content: &str, path: &str, symbols: &mut Vec<SymbolNode>, imports: &mut Vec<Import>, now: Timestamp) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, content, path, symbols, imports, now);
    }
}

fn receiver_type(node: Node, source: &[u8]) -> Option<String> {
    let receiver = node.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    let param = receiver.named_children(&mut cursor).next()?;
    let type_node = param.child_by_field_name("type")?;
    let text = type_node.utf8_text(source).ok()?;
    Some(text.trim_start_matches('*').to_string())
}

fn function_symbol(node: Node, source: &[u8], content: &str, path: &str, owner: &[String], now: Timestamp) -> Option<SymbolNode> {
    let name = common::field_text(node, "name", source)?;
    let kind = if owner.is_empty() { SymbolKind::Function } else { SymbolKind::Method };
    let parameters = node
        .child_by_field_name("parameters")
        .map(|p| common::parameter_texts(p, source))
        .unwrap_or_default();
    let return_type = common::field_text(node, "result", source);
    let visibility = if name.chars().next().is_some_and(|c| c.is_uppercase()) { Visibility::Public } else { Visibility::Private };
    let docstring = common::doc_comment_above(content, node.start_position().row, &["//"]);
    let signature = node.utf8_text(source).ok().map(|s| s.lines().next().unwrap_or(s).to_string());

    Some(common::new_symbol(
        path, owner, &name, kind, node, source, signature, docstring, return_type, parameters,
        visibility, false, false, CALL_KINDS, CONDITIONAL_KINDS, now,
    ))
}

fn type_symbol(spec: Node, source: &[u8], content: &str, path: &str, now: Timestamp) -> Option<SymbolNode> {
    let name = common::field_text(spec, "name", source)?;
    let type_node = spec.child_by_field_name("type")?;
    let kind = match type_node.kind() {
        "interface_type" => SymbolKind::Interface,
        "struct_type" => SymbolKind::Class,
        _ => SymbolKind::Type,
    };
    let visibility = if name.chars().next().is_some_and(|c| c.is_uppercase()) { Visibility::Public } else { Visibility::Private };
    let docstring = common::doc_comment_above(content, spec.start_position().row, &["//"]);
    let signature = spec.utf8_text(source).ok().map(|s| s.lines().next().unwrap_or(s).to_string());
    Some(common::new_symbol(
        path, &[], &name, kind, spec, source, signature, docstring, None, Vec::new(),
        visibility, false, false, CALL_KINDS, CONDITIONAL_KINDS, now,
    ))
}

fn collect_specs(node: Node, source: &[u8], path: &str, kind: SymbolKind, symbols: &mut Vec<SymbolNode>, now: Timestamp) {
    let mut cursor = node.walk();
    for spec in node.named_children(&mut cursor).filter(|c| matches!(c.kind(), "const_spec" | "var_spec")) {
        let mut name_cursor = spec.walk();
        for ident in spec.named_children(&mut name_cursor).filter(|c| c.kind() == "identifier") {
            let Ok(name) = ident.utf8_text(source) else { continue };
            let visibility = if name.chars().next().is_some_and(|c| c.is_uppercase()) { Visibility::Public } else { Visibility::Private };
            symbols.push(common::new_symbol(
                path, &[], name, kind, spec, source, None, None, None, Vec::new(),
                visibility, false, false, CALL_KINDS, CONDITIONAL_KINDS, now,
            ));
        }
    }
}

fn collect_imports(node: Node, source: &[u8], imports: &mut Vec<Import>) {
    let mut cursor = node.walk();
    for spec in node.named_children(&mut cursor) {
        collect_import_spec(spec, source, imports);
    }
}

fn collect_import_spec(node: Node, source: &[u8], imports: &mut Vec<Import>) {
    if node.kind() == "import_spec_list" {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            collect_import_spec(child, source, imports);
        }
        return;
    }
    if node.kind() != "import_spec" {
        return;
    }
    let Some(path_node) = node.child_by_field_name("path") else { return };
    let Ok(raw) = path_node.utf8_text(source) else { return };
    let import_path = raw.trim_matches('"').to_string();
    let alias = common::field_text(node, "name", source);
    let package_name = import_path.rsplit('/').next().unwrap_or(&import_path).to_string();
    imports.push(Import {
        source: import_path,
        imported_symbols: vec![alias.clone().unwrap_or_else(|| package_name.clone())],
        import_type: if alias.is_some() { ImportType::Namespace } else { ImportType::Default },
        is_external: true,
        package_name: Some(package_name),
        line: node.start_position().row + 1,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_and_exported_visibility() {
        let pf = parse("main.go", "package main\n\nfunc Greet() string {\n\treturn \"hi\"\n}\n");
        let sym = pf.symbols.iter().find(|s| s.name == "Greet").unwrap();
        assert_eq!(sym.visibility, Visibility::Public);
    }

    #[test]
    fn extracts_receiver_method_as_method_kind() {
        let pf = parse("main.go", "package main\n\ntype Foo struct{}\n\nfunc (f *Foo) Bar() {}\n");
        let bar = pf.symbols.iter().find(|s| s.name == "Bar").unwrap();
        assert_eq!(bar.kind, SymbolKind::Method);
        assert!(bar.qualified_name.contains("Foo.Bar"));
    }
}
