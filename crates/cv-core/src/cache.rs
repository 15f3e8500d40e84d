//! Process-global, namespaced LRU query cache.
//!
//! Sits in front of the graph store, the vector store, and AI calls. Each
//! namespace keeps its own eviction order and its own hit/miss counters so a
//! noisy namespace (e.g. `ai`) cannot evict entries a different namespace
//! still needs.

use dashmap::DashMap;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Graph,
    Vector,
    Ai,
}

impl CacheNamespace {
    fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Graph => "graph",
            CacheNamespace::Vector => "vector",
            CacheNamespace::Ai => "ai",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

struct Namespace {
    entries: Mutex<LruCache<String, serde_json::Value>>,
    stats: Mutex<CacheStats>,
}

impl Namespace {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(CacheStats::default()),
        }
    }
}

/// The cache itself. Construct one per process (see [`global`] for the
/// module-level singleton) or one per test via [`QueryCache::new`].
pub struct QueryCache {
    namespaces: DashMap<&'static str, Namespace>,
    capacity: NonZeroUsize,
}

impl QueryCache {
    pub fn new(capacity_per_namespace: usize) -> Self {
        let capacity =
            NonZeroUsize::new(capacity_per_namespace).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            namespaces: DashMap::new(),
            capacity,
        }
    }

    fn namespace(&self, ns: CacheNamespace) -> dashmap::mapref::one::Ref<'_, &'static str, Namespace> {
        self.namespaces
            .entry(ns.as_str())
            .or_insert_with(|| Namespace::new(self.capacity));
        self.namespaces.get(ns.as_str()).unwrap()
    }

    pub fn get(&self, ns: CacheNamespace, key: &str) -> Option<serde_json::Value> {
        let slot = self.namespace(ns);
        let mut entries = slot.entries.lock().unwrap();
        let hit = entries.get(key).cloned();
        let mut stats = slot.stats.lock().unwrap();
        if hit.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        hit
    }

    pub fn put(&self, ns: CacheNamespace, key: String, value: serde_json::Value) {
        let slot = self.namespace(ns);
        slot.entries.lock().unwrap().put(key, value);
    }

    /// Invalidate by exact key, or by substring match if `key_or_substring`
    /// does not match any entry exactly.
    pub fn invalidate(&self, ns: CacheNamespace, key_or_substring: &str) -> usize {
        let slot = self.namespace(ns);
        let mut entries = slot.entries.lock().unwrap();
        if entries.contains(key_or_substring) {
            entries.pop(key_or_substring);
            return 1;
        }
        let matching: Vec<String> = entries
            .iter()
            .filter(|(k, _)| k.contains(key_or_substring))
            .map(|(k, _)| k.clone())
            .collect();
        for k in &matching {
            entries.pop(k);
        }
        matching.len()
    }

    /// Clears a namespace entirely and resets its hit/miss counters.
    pub fn clear_namespace(&self, ns: CacheNamespace) {
        let slot = self.namespace(ns);
        slot.entries.lock().unwrap().clear();
        *slot.stats.lock().unwrap() = CacheStats::default();
    }

    pub fn stats(&self, ns: CacheNamespace) -> CacheStats {
        let slot = self.namespace(ns);
        *slot.stats.lock().unwrap()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

static GLOBAL: OnceLock<QueryCache> = OnceLock::new();

/// Lazily-initialized process-global cache instance.
pub fn global() -> &'static QueryCache {
    GLOBAL.get_or_init(QueryCache::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_hits_and_misses_per_namespace() {
        let cache = QueryCache::new(8);
        assert!(cache.get(CacheNamespace::Graph, "a").is_none());
        cache.put(CacheNamespace::Graph, "a".into(), serde_json::json!(1));
        assert_eq!(cache.get(CacheNamespace::Graph, "a"), Some(serde_json::json!(1)));

        let stats = cache.stats(CacheNamespace::Graph);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        // A different namespace starts from zero.
        assert_eq!(cache.stats(CacheNamespace::Vector).hits, 0);
    }

    #[test]
    fn invalidate_by_substring_removes_matching_keys() {
        let cache = QueryCache::new(8);
        cache.put(CacheNamespace::Vector, "src/a.rs:10".into(), serde_json::json!("x"));
        cache.put(CacheNamespace::Vector, "src/a.rs:20".into(), serde_json::json!("y"));
        cache.put(CacheNamespace::Vector, "src/b.rs:5".into(), serde_json::json!("z"));

        let removed = cache.invalidate(CacheNamespace::Vector, "src/a.rs");
        assert_eq!(removed, 2);
        assert!(cache.get(CacheNamespace::Vector, "src/b.rs:5").is_some());
    }

    #[test]
    fn clear_namespace_resets_counters() {
        let cache = QueryCache::new(8);
        cache.put(CacheNamespace::Ai, "q".into(), serde_json::json!(1));
        let _ = cache.get(CacheNamespace::Ai, "q");
        cache.clear_namespace(CacheNamespace::Ai);
        assert_eq!(cache.stats(CacheNamespace::Ai).hits, 0);
        assert!(cache.get(CacheNamespace::Ai, "q").is_none());
    }
}
