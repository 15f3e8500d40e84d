//! Repository discovery: walks up from the current directory looking for
//! `.git`, the same way every subcommand needs to find its root before
//! touching `.cv/`.

use cv_core::{ids, CvError};
use std::path::{Path, PathBuf};

/// Walks `start` and its ancestors looking for a `.git` entry.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if d.join(".git").exists() {
            return Some(d.to_path_buf());
        }
        dir = d.parent();
    }
    None
}

/// Resolves the repo root from the current directory, or `CvError::NotInRepo`.
pub fn require_repo_root() -> Result<PathBuf, CvError> {
    let cwd = std::env::current_dir().map_err(CvError::Io)?;
    find_repo_root(&cwd).ok_or(CvError::NotInRepo)
}

/// `require_repo_root` plus a check that `cv init` has actually run.
pub fn require_initialized_repo() -> Result<PathBuf, CvError> {
    let root = require_repo_root()?;
    if !cv_dir(&root).join("config.json").exists() {
        return Err(CvError::NotInitialized);
    }
    Ok(root)
}

pub fn cv_dir(repo_root: &Path) -> PathBuf {
    repo_root.join(".cv")
}

/// A stable, filesystem-safe identifier scoping graph/vector records to this
/// repository: the directory's basename plus a short content hash of its
/// canonical path, so two checkouts named the same way don't collide.
pub fn repo_id_for(repo_root: &Path) -> String {
    let canonical = dunce::canonicalize(repo_root).unwrap_or_else(|_| repo_root.to_path_buf());
    let basename: String = canonical
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "repo".to_string())
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let hash = ids::hash_content(canonical.to_string_lossy().as_bytes());
    format!("{basename}-{}", &hash[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_repo_root_from_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
        let nested = tmp.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_repo_root(&nested), Some(tmp.path().to_path_buf()));
    }

    #[test]
    fn returns_none_outside_any_repo() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(find_repo_root(tmp.path()), None);
    }

    #[test]
    fn repo_id_is_stable_across_calls() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(repo_id_for(tmp.path()), repo_id_for(tmp.path()));
    }
}
