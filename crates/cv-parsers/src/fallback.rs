//! Regex-based fallback extractor, used when a grammar is missing or a
//! tree-sitter parse fails outright. Produces the same [`ParsedFile`] shape
//! as the grammar-backed extractors, just coarser: function/class-ish
//! declarations found by keyword regex, end line approximated by brace or
//! indentation within a short lookahead window, one symbol per match.

use cv_core::model::{CodeChunk, ParsedFile, SymbolKind, SymbolNode, Visibility};
use cv_core::{ids, Clock, SystemClock};
use std::sync::OnceLock;

const LOOKAHEAD_LINES: usize = 100;

struct Pattern {
    regex: &'static str,
    kind: SymbolKind,
    name_group: usize,
}

fn patterns_for(language: &str) -> &'static [Pattern] {
    static RUST: OnceLock<Vec<Pattern>> = OnceLock::new();
    static C_FAMILY: OnceLock<Vec<Pattern>> = OnceLock::new();
    static PY: OnceLock<Vec<Pattern>> = OnceLock::new();
    static GENERIC: OnceLock<Vec<Pattern>> = OnceLock::new();

    match language {
        "rust" => RUST.get_or_init(|| {
            vec![
                Pattern { regex: r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+(\w+)", kind: SymbolKind::Function, name_group: 1 },
                Pattern { regex: r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum)\s+(\w+)", kind: SymbolKind::Class, name_group: 1 },
                Pattern { regex: r"^\s*(?:pub(?:\([^)]*\))?\s+)?trait\s+(\w+)", kind: SymbolKind::Interface, name_group: 1 },
            ]
        }),
        "python" => PY.get_or_init(|| {
            vec![
                Pattern { regex: r"^\s*(?:async\s+)?def\s+(\w+)", kind: SymbolKind::Function, name_group: 1 },
                Pattern { regex: r"^\s*class\s+(\w+)", kind: SymbolKind::Class, name_group: 1 },
            ]
        }),
        "go" => C_FAMILY.get_or_init(|| {
            vec![
                Pattern { regex: r"^\s*func\s+(?:\([^)]*\)\s+)?(\w+)", kind: SymbolKind::Function, name_group: 1 },
                Pattern { regex: r"^\s*type\s+(\w+)\s+(?:struct|interface)", kind: SymbolKind::Class, name_group: 1 },
            ]
        }),
        "java" => GENERIC.get_or_init(|| {
            vec![
                Pattern { regex: r"^\s*(?:public|private|protected)?\s*(?:static\s+)?(?:[\w<>\[\],\s]+)\s+(\w+)\s*\([^;{]*\)\s*\{", kind: SymbolKind::Method, name_group: 1 },
                Pattern { regex: r"^\s*(?:public\s+)?(?:final\s+)?(?:class|interface)\s+(\w+)", kind: SymbolKind::Class, name_group: 1 },
            ]
        }),
        "typescript" | "javascript" => GENERIC.get_or_init(|| {
            vec![
                Pattern { regex: r"^\s*(?:export\s+)?(?:async\s+)?function\s+(\w+)", kind: SymbolKind::Function, name_group: 1 },
                Pattern { regex: r"^\s*(?:export\s+)?class\s+(\w+)", kind: SymbolKind::Class, name_group: 1 },
                Pattern { regex: r"^\s*(?:export\s+)?interface\s+(\w+)", kind: SymbolKind::Interface, name_group: 1 },
            ]
        }),
        _ => GENERIC.get_or_init(Vec::new),
    }
}

/// Parses `content` using keyword-regex matching only. Used when a language
/// has no compiled grammar, or when the grammar-backed parse for `language`
/// failed (e.g. a tree-sitter initialization error).
pub fn parse(path: &str, content: &str, language: &str) -> ParsedFile {
    tracing::warn!(file = path, language, "falling back to regex extraction");
    let now = SystemClock.now();
    let lines: Vec<&str> = content.lines().collect();
    let patterns = patterns_for(language);
    let mut symbols = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        for pattern in patterns {
            let re = compiled(pattern.regex);
            if let Some(caps) = re.captures(line) {
                let Some(name) = caps.get(pattern.name_group) else { continue };
                let start_line = idx + 1;
                let end_line = approximate_end(&lines, idx);
                symbols.push(SymbolNode {
                    qualified_name: ids::qualified_name(path, &[], name.as_str()),
                    name: name.as_str().to_string(),
                    kind: pattern.kind,
                    file: path.to_string(),
                    start_line,
                    end_line,
                    signature: Some(line.trim().to_string()),
                    docstring: None,
                    return_type: None,
                    parameters: Vec::new(),
                    visibility: Visibility::Public,
                    is_async: line.contains("async"),
                    is_static: line.contains("static"),
                    complexity: 1,
                    calls: Vec::new(),
                    created_at: now,
                    updated_at: now,
                });
                break;
            }
        }
    }

    let chunks = build_chunks(path, content, language, &symbols);
    ParsedFile {
        path: path.to_string(),
        language: language.to_string(),
        content: content.to_string(),
        symbols,
        imports: Vec::new(),
        exports: Vec::new(),
        chunks,
    }
}

fn compiled(pattern: &'static str) -> regex::Regex {
    regex::Regex::new(pattern).expect("fallback pattern must compile")
}

/// Follows brace depth (or, for brace-less indentation-based declarations,
/// an indentation drop) for up to [`LOOKAHEAD_LINES`] lines to guess where a
/// declaration found by regex actually ends. This is an approximation by
/// design: the fallback path trades precision for always returning
/// something rather than nothing.
fn approximate_end(lines: &[&str], start_idx: usize) -> usize {
    let start_line = lines[start_idx];
    let base_indent = start_line.len() - start_line.trim_start().len();
    let mut depth = 0i32;
    let mut seen_brace = false;
    let limit = (start_idx + LOOKAHEAD_LINES).min(lines.len());

    for (offset, line) in lines[start_idx..limit].iter().enumerate() {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    seen_brace = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if seen_brace && depth <= 0 && offset > 0 {
            return start_idx + offset + 1;
        }
        if !seen_brace && offset > 0 {
            let indent = line.len() - line.trim_start().len();
            if !line.trim().is_empty() && indent <= base_indent {
                return start_idx + offset;
            }
        }
    }
    limit.max(start_idx + 1)
}

fn build_chunks(path: &str, content: &str, language: &str, symbols: &[SymbolNode]) -> Vec<CodeChunk> {
    crate::common::build_chunks(path, content, language, symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_rust_function_by_keyword() {
        let pf = parse("f.rs", "pub fn greet() {\n    println!(\"hi\");\n}\n", "rust");
        assert_eq!(pf.symbols.len(), 1);
        assert_eq!(pf.symbols[0].name, "greet");
    }

    #[test]
    fn finds_python_def_without_braces() {
        let pf = parse("f.py", "def greet():\n    return 1\n\ndef other():\n    return 2\n", "python");
        assert_eq!(pf.symbols.len(), 2);
        assert_eq!(pf.symbols[0].name, "greet");
        assert_eq!(pf.symbols[0].end_line, 3);
    }

    #[test]
    fn unknown_language_yields_no_symbols_but_still_chunks() {
        let pf = parse("f.txt", "just some text\nmore text\n", "text");
        assert!(pf.symbols.is_empty());
        assert!(!pf.chunks.is_empty());
    }
}
