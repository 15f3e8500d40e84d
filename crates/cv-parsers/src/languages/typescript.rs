//! TypeScript extractor, via `tree-sitter-typescript`. Adds interfaces and
//! type aliases on top of the JavaScript walk shared through [`super::ecma`].

use crate::languages::ecma;
use cv_core::model::ParsedFile;

pub fn parse(path: &str, content: &str) -> ParsedFile {
    ecma::parse(path, content, tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(), "typescript")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::model::SymbolKind;

    #[test]
    fn extracts_interface_and_type_alias() {
        let pf = parse("a.ts", "export interface Foo {\n  bar: string;\n}\n\ntype Baz = string | number;\n");
        let foo = pf.symbols.iter().find(|s| s.name == "Foo").unwrap();
        assert_eq!(foo.kind, SymbolKind::Interface);
        let baz = pf.symbols.iter().find(|s| s.name == "Baz").unwrap();
        assert_eq!(baz.kind, SymbolKind::Type);
    }

    #[test]
    fn extracts_typed_function_parameters() {
        let pf = parse("a.ts", "function add(a: number, b: number): number {\n  return a + b;\n}\n");
        let add = pf.symbols.iter().find(|s| s.name == "add").unwrap();
        assert_eq!(add.parameters.len(), 2);
        assert_eq!(add.return_type.as_deref(), Some("number"));
    }
}
