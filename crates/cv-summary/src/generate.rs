//! Summary text generation: an LLM path when a service is configured, and a
//! plain extractive fallback when it isn't.
//!
//! Grounded in `ai-llm-service`'s client shape (`LlmModelConfig`,
//! `LlmServiceProfiles`), generalized here as `cv-ai`. The extractive
//! fallback has no template counterpart; it is written in the same
//! plain-function style the template uses elsewhere for small pure-data
//! transforms (`codegraph-prep::core::ids`).

use crate::errors::Result;
use cv_ai::LlmServiceProfiles;
use std::sync::Arc;

/// Generates one level of summary text.
///
/// `fast` selects between the fast (draft) and slow (quality) profile: the
/// higher up the hierarchy a summary sits, the fewer of them there are and
/// the more a slower, higher-quality pass is worth the latency.
pub async fn generate(profiles: Option<&Arc<LlmServiceProfiles>>, prompt: &str, fast: bool, fallback: impl FnOnce() -> String) -> Result<String> {
    match profiles {
        Some(svc) => {
            let text = if fast { svc.generate_fast(prompt, None).await? } else { svc.generate_slow(prompt, None).await? };
            let trimmed = text.trim();
            if trimmed.is_empty() { Ok(fallback()) } else { Ok(trimmed.to_string()) }
        }
        None => Ok(fallback()),
    }
}

/// Extractive fallback for a single symbol: first sentence of its
/// docstring, or a name-and-file template when there is no docstring.
pub fn extractive_symbol_summary(name: &str, file: &str, docstring: Option<&str>) -> String {
    match docstring.map(str::trim).filter(|s| !s.is_empty()) {
        Some(doc) => first_sentence(doc),
        None => format!("`{name}` in `{file}`."),
    }
}

/// Extractive fallback for a file: names its symbols, or just its path if it
/// has none.
pub fn extractive_file_summary(path: &str, symbol_names: &[String]) -> String {
    if symbol_names.is_empty() {
        return format!("`{path}`, no indexed symbols.");
    }
    let shown: Vec<&str> = symbol_names.iter().take(8).map(String::as_str).collect();
    let suffix = if symbol_names.len() > shown.len() { format!(" and {} more", symbol_names.len() - shown.len()) } else { String::new() };
    format!("`{path}`: {}{suffix}.", shown.join(", "))
}

/// Extractive fallback for a directory or the repo root: names its children.
pub fn extractive_aggregate_summary(path: &str, child_names: &[String]) -> String {
    if child_names.is_empty() {
        return format!("`{path}`, empty.");
    }
    let shown: Vec<&str> = child_names.iter().take(8).map(String::as_str).collect();
    let suffix = if child_names.len() > shown.len() { format!(" and {} more", child_names.len() - shown.len()) } else { String::new() };
    format!("`{path}` containing {}{suffix}.", shown.join(", "))
}

fn first_sentence(text: &str) -> String {
    match text.find(['.', '\n']) {
        Some(idx) => text[..=idx.min(text.len() - 1)].trim().trim_end_matches('\n').to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extractive_symbol_prefers_docstring_first_sentence() {
        let s = extractive_symbol_summary("run", "src/a.rs", Some("Runs the thing. Twice."));
        assert_eq!(s, "Runs the thing.");
    }

    #[test]
    fn extractive_symbol_falls_back_to_name_and_file() {
        let s = extractive_symbol_summary("run", "src/a.rs", None);
        assert_eq!(s, "`run` in `src/a.rs`.");
    }

    #[test]
    fn extractive_file_lists_symbols() {
        let s = extractive_file_summary("src/a.rs", &["run".into(), "stop".into()]);
        assert_eq!(s, "`src/a.rs`: run, stop.");
    }

    #[test]
    fn extractive_file_handles_empty() {
        let s = extractive_file_summary("src/a.rs", &[]);
        assert_eq!(s, "`src/a.rs`, no indexed symbols.");
    }
}
