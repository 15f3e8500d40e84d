//! Repo-scoped `.cv/config.json` and the user-scoped `$HOME/.cv-git/`
//! global config (§6). Both are loaded and edited as a plain
//! [`serde_json::Value`] addressed by dotted paths (`ai.provider`,
//! `graph.semantic_bridge_max_depth`) rather than a closed struct, since the
//! `config get/set/list` surface needs to round-trip arbitrary recognized
//! and unrecognized keys alike.

use cv_core::CvError;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub fn repo_config_path(repo_root: &Path) -> PathBuf {
    repo_root.join(".cv").join("config.json")
}

pub fn global_config_dir() -> PathBuf {
    dirs_home().join(".cv-git")
}

pub fn global_config_path() -> PathBuf {
    global_config_dir().join("config.json")
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(std::env::temp_dir)
}

/// Loads a JSON config file, defaulting to `{}` when absent.
pub fn load(path: &Path) -> Result<Value, CvError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Value::Object(Default::default())),
        Err(e) => Err(CvError::Io(e)),
    }
}

/// Writes a JSON config file via temp-file + rename, matching the template's
/// durable-write idiom (`rag-store::io_jsonl`).
pub fn save(path: &Path, value: &Value) -> Result<(), CvError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Resolves `platform.type` / `ai.provider`-style dotted paths.
pub fn get_path<'a>(value: &'a Value, dotted_key: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in dotted_key.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Sets a dotted path, creating intermediate objects as needed.
pub fn set_path(value: &mut Value, dotted_key: &str, new_value: Value) {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let mut current = value;
    for segment in &segments[..segments.len() - 1] {
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        current = current.as_object_mut().unwrap().entry(segment.to_string()).or_insert_with(|| Value::Object(Default::default()));
    }
    if !current.is_object() {
        *current = Value::Object(Default::default());
    }
    current.as_object_mut().unwrap().insert(segments[segments.len() - 1].to_string(), new_value);
}

/// Removes a dotted path; no-op if it doesn't exist.
pub fn remove_path(value: &mut Value, dotted_key: &str) {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let mut current = value;
    for segment in &segments[..segments.len() - 1] {
        match current.get_mut(*segment) {
            Some(next) => current = next,
            None => return,
        }
    }
    if let Some(obj) = current.as_object_mut() {
        obj.remove(segments[segments.len() - 1]);
    }
}

/// Merges precedence (env var > repo config > global config > default) for
/// one string-valued key, as described in the Configuration section.
pub fn resolve_str(env_var: &str, repo_cfg: &Value, global_cfg: &Value, dotted_key: &str, default: &str) -> String {
    if let Ok(v) = std::env::var(env_var) {
        if !v.trim().is_empty() {
            return v;
        }
    }
    if let Some(v) = get_path(repo_cfg, dotted_key).and_then(Value::as_str) {
        return v.to_string();
    }
    if let Some(v) = get_path(global_cfg, dotted_key).and_then(Value::as_str) {
        return v.to_string();
    }
    default.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips_nested_path() {
        let mut v = Value::Object(Default::default());
        set_path(&mut v, "ai.provider", Value::String("ollama".into()));
        assert_eq!(get_path(&v, "ai.provider").and_then(Value::as_str), Some("ollama"));
    }

    #[test]
    fn remove_path_drops_leaf_only() {
        let mut v = Value::Object(Default::default());
        set_path(&mut v, "ai.provider", Value::String("ollama".into()));
        set_path(&mut v, "ai.model", Value::String("llama3".into()));
        remove_path(&mut v, "ai.provider");
        assert!(get_path(&v, "ai.provider").is_none());
        assert!(get_path(&v, "ai.model").is_some());
    }

    #[test]
    fn load_missing_file_defaults_to_empty_object() {
        let v = load(Path::new("/nonexistent/cv-config-test.json")).unwrap();
        assert!(v.as_object().unwrap().is_empty());
    }
}
