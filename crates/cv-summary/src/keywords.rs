//! Lightweight keyword extraction: splits identifier names into words and
//! keeps the most frequent ones. No LLM involved, same pure-function style
//! as `cv_core::ids`.

use std::collections::HashMap;

const MAX_KEYWORDS: usize = 8;

/// Derives up to 8 keywords from a set of identifier-like names (symbol
/// names, file stems, directory names), splitting camelCase and
/// snake_case/kebab-case into words and ranking by frequency.
pub fn derive(names: &[String]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in names {
        for word in split_identifier(name) {
            if word.len() < 2 {
                continue;
            }
            *counts.entry(word.to_lowercase()).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(MAX_KEYWORDS).map(|(w, _)| w).collect()
}

fn split_identifier(name: &str) -> Vec<String> {
    let stem = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = stem.split('.').next().unwrap_or(stem);

    let mut words = Vec::new();
    let mut current = String::new();
    for ch in stem.chars() {
        if ch == '_' || ch == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_snake_case() {
        assert_eq!(split_identifier("parse_file_name"), vec!["parse", "file", "name"]);
    }

    #[test]
    fn splits_camel_case() {
        assert_eq!(split_identifier("parseFileName"), vec!["parse", "File", "Name"]);
    }

    #[test]
    fn strips_path_and_extension() {
        assert_eq!(split_identifier("src/utils/io.rs"), vec!["io"]);
    }

    #[test]
    fn ranks_by_frequency_then_alpha() {
        let names = vec!["parse_file".to_string(), "parse_dir".to_string(), "write_file".to_string()];
        let kws = derive(&names);
        assert_eq!(kws[0], "parse");
        assert!(kws.contains(&"file".to_string()));
    }
}
