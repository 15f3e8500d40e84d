//! Extension-based dispatch to the per-language extractors, with the regex
//! fallback as the uniform last resort.

use crate::languages;
use cv_core::model::ParsedFile;

/// Stateless dispatcher from file extension to the matching extractor.
/// Cheap to clone: it carries no state of its own, just the dispatch logic,
/// which keeps it safe to hand to `tokio::task::spawn_blocking` per file as
/// the sync engine does.
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry;

impl ParserRegistry {
    pub fn new() -> Self {
        ParserRegistry
    }

    /// Parses `content` for `path`, dispatching on extension. Never fails:
    /// an unrecognized extension or a grammar error both degrade to the
    /// regex fallback rather than propagating an error up to the sync
    /// engine's per-file pipeline.
    pub fn parse_file(&self, path: &str, content: &str) -> ParsedFile {
        match self.language(path) {
            Some("rust") => languages::rust::parse(path, content),
            Some("python") => languages::python::parse(path, content),
            Some("go") => languages::go::parse(path, content),
            Some("java") => languages::java::parse(path, content),
            Some("typescript") => languages::typescript::parse(path, content),
            Some("javascript") => languages::javascript::parse(path, content),
            Some(other) => crate::fallback::parse(path, content, other),
            None => crate::fallback::parse(path, content, "unknown"),
        }
    }

    pub fn language(&self, path: &str) -> Option<&'static str> {
        let ext = path.rsplit('.').next()?.to_lowercase();
        Some(match ext.as_str() {
            "rs" => "rust",
            "py" | "pyi" => "python",
            "go" => "go",
            "java" => "java",
            "ts" | "tsx" => "typescript",
            "js" | "jsx" | "mjs" | "cjs" => "javascript",
            _ => return None,
        })
    }

    pub fn supported_extensions(&self) -> &'static [&'static str] {
        &["rs", "py", "pyi", "go", "java", "ts", "tsx", "js", "jsx", "mjs", "cjs"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_extension() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.language("src/lib.rs"), Some("rust"));
        assert_eq!(registry.language("app.tsx"), Some("typescript"));
        assert_eq!(registry.language("README.md"), None);
    }

    #[test]
    fn unknown_extension_falls_back_without_panicking() {
        let registry = ParserRegistry::new();
        let pf = registry.parse_file("data.proto", "message Foo {}\n");
        assert_eq!(pf.language, "unknown");
    }
}
