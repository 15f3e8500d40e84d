//! Runtime configuration loaded from the repo-scoped `.cv/config.json`.

use std::path::Path;

/// Config bag for the semantic-graph service. All fields have defaults.
#[derive(Clone, Debug)]
pub struct SemanticConfig {
    /// Max BFS depth `findSemanticBridge` falls back to when the two
    /// top-k hit sets don't intersect directly. Read from
    /// `graph.semantic_bridge_max_depth`.
    pub semantic_bridge_max_depth: u32,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self { semantic_bridge_max_depth: 4 }
    }
}

impl SemanticConfig {
    /// Reads `<repo_root>/.cv/config.json`'s `graph.semantic_bridge_max_depth`
    /// key, falling back to the default when the file, key, or repo is
    /// missing — a config problem here should never block a semantic query.
    pub fn from_repo_root(repo_root: impl AsRef<Path>) -> Self {
        let path = repo_root.as_ref().join(".cv").join("config.json");
        let depth = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
            .and_then(|v| v.get("graph")?.get("semantic_bridge_max_depth")?.as_u64())
            .map(|d| d as u32)
            .unwrap_or(4);
        Self { semantic_bridge_max_depth: depth }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_four_when_config_missing() {
        let dir = tempfile_dir();
        assert_eq!(SemanticConfig::from_repo_root(&dir).semantic_bridge_max_depth, 4);
    }

    #[test]
    fn reads_configured_depth() {
        let dir = tempfile_dir();
        let cv_dir = dir.join(".cv");
        std::fs::create_dir_all(&cv_dir).unwrap();
        std::fs::write(cv_dir.join("config.json"), r#"{"graph":{"semantic_bridge_max_depth":7}}"#).unwrap();
        assert_eq!(SemanticConfig::from_repo_root(&dir).semantic_bridge_max_depth, 7);
    }

    fn tempfile_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("cv-semantic-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
