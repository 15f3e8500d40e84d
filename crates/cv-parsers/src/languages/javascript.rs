//! JavaScript extractor, via `tree-sitter-javascript`. Shares its walk with
//! [`super::typescript`] through [`super::ecma`].

use crate::languages::ecma;
use cv_core::model::ParsedFile;

pub fn parse(path: &str, content: &str) -> ParsedFile {
    ecma::parse(path, content, tree_sitter_javascript::LANGUAGE.into(), "javascript")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::model::SymbolKind;

    #[test]
    fn extracts_function_and_class() {
        let pf = parse("a.js", "function greet() {\n  return 1;\n}\n\nclass Foo {\n  bar() {}\n}\n");
        let greet = pf.symbols.iter().find(|s| s.name == "greet").unwrap();
        assert_eq!(greet.kind, SymbolKind::Function);
        let bar = pf.symbols.iter().find(|s| s.name == "bar").unwrap();
        assert_eq!(bar.kind, SymbolKind::Method);
    }

    #[test]
    fn extracts_arrow_function_const() {
        let pf = parse("a.js", "const add = (a, b) => a + b;\n");
        let add = pf.symbols.iter().find(|s| s.name == "add").unwrap();
        assert_eq!(add.kind, SymbolKind::Function);
    }
}
