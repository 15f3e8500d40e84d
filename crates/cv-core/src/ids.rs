//! Stable identifiers and content hashing.
//!
//! Chunk and symbol identity must survive re-parsing byte-identical input, so
//! ids are derived from content rather than allocated sequentially.

use sha2::{Digest, Sha256};

/// SHA-256 content hash, rendered as lowercase hex.
///
/// Used for `HierarchicalSummaryPayload.contentHash` and for the sync
/// engine's change-detection keys.
pub fn hash_content(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Hash of a sorted list of child hashes, used for directory/repo level
/// `HierarchicalSummaryPayload.contentHash` per the bottom-up aggregation
/// rule.
pub fn hash_children(mut children: Vec<String>) -> String {
    children.sort();
    hash_content(children.join("").as_bytes())
}

/// Deterministic chunk id: `"{file}:{start_line}"`.
pub fn chunk_id(file: &str, start_line: usize) -> String {
    format!("{file}:{start_line}")
}

/// Deterministic qualified name: file + ":" + dotted scope (or bare name).
pub fn qualified_name(file: &str, owner_path: &[String], name: &str) -> String {
    if owner_path.is_empty() {
        format!("{file}:{name}")
    } else {
        format!("{file}:{}.{name}", owner_path.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_content(b"fn main() {}"), hash_content(b"fn main() {}"));
        assert_ne!(hash_content(b"fn main() {}"), hash_content(b"fn other() {}"));
    }

    #[test]
    fn chunk_id_matches_file_and_start_line() {
        assert_eq!(chunk_id("foo.ts", 10), "foo.ts:10");
    }

    #[test]
    fn qualified_name_joins_owner_chain_with_dots() {
        assert_eq!(
            qualified_name("a.ts", &["Foo".to_string(), "Bar".to_string()], "baz"),
            "a.ts:Foo.Bar.baz"
        );
        assert_eq!(qualified_name("a.ts", &[], "baz"), "a.ts:baz");
    }
}
