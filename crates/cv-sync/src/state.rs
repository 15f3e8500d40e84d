//! `.cv/sync-state.json`: file path → content hash, the basis for
//! incremental change detection.

use crate::errors::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct SyncState {
    pub hashes: HashMap<String, String>,
}

impl SyncState {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Unchanged,
    Added,
    Modified,
}

pub fn classify(state: &SyncState, path: &str, content_hash: &str) -> ChangeKind {
    match state.hashes.get(path) {
        Some(prev) if prev == content_hash => ChangeKind::Unchanged,
        Some(_) => ChangeKind::Modified,
        None => ChangeKind::Added,
    }
}

/// Paths present in `state` but absent from `current_paths` — the deleted
/// set for this run.
pub fn deleted_paths<'a>(state: &'a SyncState, current_paths: &std::collections::HashSet<String>) -> Vec<&'a str> {
    state
        .hashes
        .keys()
        .filter(|p| !current_paths.contains(p.as_str()))
        .map(|p| p.as_str())
        .collect()
}
