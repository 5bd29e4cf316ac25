use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde_json::Value;

/// Request-scoped context carried through every call.
///
/// Holds the per-call GET response cache, so cached bodies are never shared
/// across concurrent requests; only the querier's global cache tag is shared
/// state. One `UserContext` per inbound request; create a fresh one for each
/// independent top-level call.
pub struct UserContext {
    cache: Mutex<HashMap<String, CacheEntry>>,
    keep_cache_alive: AtomicBool,
    /// A detached context is one with no coherent request scope behind it.
    /// GETs issued with it bypass and invalidate the cache, since there is
    /// no request lifetime bounding what the entries may reflect.
    detached: bool,
}

#[derive(Clone)]
struct CacheEntry {
    body: Value,
    tag: u64,
}

impl UserContext {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            keep_cache_alive: AtomicBool::new(false),
            detached: false,
        }
    }

    /// Context for callers with no request scope (background jobs, CLIs).
    pub fn detached() -> Self {
        Self {
            detached: true,
            ..Self::new()
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Scope flag: while set, mutating calls do not advance the global cache
    /// tag. Only for sequences the caller knows are cache-irrelevant.
    pub fn set_keep_cache_alive(&self, keep: bool) {
        self.keep_cache_alive.store(keep, Ordering::Relaxed);
    }

    pub fn keep_cache_alive(&self) -> bool {
        self.keep_cache_alive.load(Ordering::Relaxed)
    }

    /// A cached body is returned only when its tag still equals the current
    /// global tag; a stale tag means some mutating call may have changed
    /// server state the entry would misreport.
    pub(crate) fn cache_lookup(&self, key: &str, current_tag: u64) -> Option<Value> {
        let cache = self.cache.lock().ok()?;
        let entry = cache.get(key)?;
        if entry.tag == current_tag {
            Some(entry.body.clone())
        } else {
            None
        }
    }

    pub(crate) fn cache_store(&self, key: String, body: Value, tag: u64) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, CacheEntry { body, tag });
        }
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_requires_matching_tag() {
        let ctx = UserContext::new();
        ctx.cache_store("k".into(), json!({"a": 1}), 7);

        assert_eq!(ctx.cache_lookup("k", 7), Some(json!({"a": 1})));
        assert_eq!(ctx.cache_lookup("k", 8), None);
        assert_eq!(ctx.cache_lookup("missing", 7), None);
    }

    #[test]
    fn test_keep_cache_alive_flag() {
        let ctx = UserContext::new();
        assert!(!ctx.keep_cache_alive());
        ctx.set_keep_cache_alive(true);
        assert!(ctx.keep_cache_alive());
    }
}
