//! File discovery: walks the working tree honoring a fixed ignore set plus
//! optional language/path-glob filters.

use crate::errors::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never descended into regardless of filters.
const IGNORED_DIRS: &[&str] = &[
    ".git", ".cv", ".hg", ".svn", "node_modules", "target", "dist", "build",
    "vendor", ".venv", "venv", "__pycache__", ".next", ".cache",
];

#[derive(Debug, Clone, Default)]
pub struct DiscoverFilters {
    pub languages: Vec<String>,
    pub path_globs: Vec<String>,
}

impl DiscoverFilters {
    fn glob_set(&self) -> Result<Option<GlobSet>> {
        if self.path_globs.is_empty() {
            return Ok(None);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.path_globs {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Some(builder.build()?))
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the repository root, forward-slash separated.
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub language: Option<String>,
}

pub fn discover(root: &Path, filters: &DiscoverFilters) -> Result<Vec<DiscoveredFile>> {
    let globs = filters.glob_set()?;
    let mut out = Vec::new();

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e))
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let abs_path = entry.path().to_path_buf();
        let Ok(rel) = abs_path.strip_prefix(root) else { continue };
        let rel_path = rel.to_string_lossy().replace('\\', "/");

        let language = language_for_extension(&abs_path);
        if !filters.languages.is_empty() {
            match &language {
                Some(lang) if filters.languages.iter().any(|l| l.eq_ignore_ascii_case(lang)) => {}
                _ => continue,
            }
        }
        if let Some(set) = &globs {
            if !set.is_match(&rel_path) {
                continue;
            }
        }
        out.push(DiscoveredFile { rel_path, abs_path, language });
    }

    out.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(out)
}

fn is_ignored_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| IGNORED_DIRS.contains(&name))
            .unwrap_or(false)
}

/// Language tag for the parser registry, or `None` for unrecognized/binary
/// extensions (still discovered, but skipped at the parse stage).
pub fn language_for_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let lang = match ext.as_str() {
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" | "pyi" => "python",
        "go" => "go",
        "rs" => "rust",
        "java" => "java",
        "md" | "mdx" | "markdown" => "markdown",
        _ => return None,
    };
    Some(lang.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn skips_ignored_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/lib.js"), "x").unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

        let files = discover(dir.path(), &DiscoverFilters::default()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["main.rs"]);
    }

    #[test]
    fn filters_by_language() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();
        fs::write(dir.path().join("b.py"), "def b(): pass").unwrap();

        let filters = DiscoverFilters { languages: vec!["python".into()], path_globs: vec![] };
        let files = discover(dir.path(), &filters).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, "b.py");
    }
}
