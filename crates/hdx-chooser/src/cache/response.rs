//! Response cache
//!
//! Process-lifetime memo of catalog responses keyed by request signature.
//! Entries are read-only snapshots; nothing is evicted or expired during a
//! session, and only successful responses are ever stored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::keys::RequestSignature;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of stored responses
    pub entries: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to go to the catalog or join an in-flight call
    pub misses: u64,
    /// Callers that waited on another caller's in-flight request
    pub coalesced: u64,
    /// Calls actually sent to the catalog
    pub network_calls: u64,
}

impl CacheStats {
    /// Hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Append-only response cache
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<RequestSignature, Arc<Value>>,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    network_calls: AtomicU64,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a response, counting the hit or miss
    pub fn get(&self, signature: &RequestSignature) -> Option<Arc<Value>> {
        match self.entries.get(signature) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(signature = %signature, "Cache hit");
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Look up a response without touching the counters
    pub fn peek(&self, signature: &RequestSignature) -> Option<Arc<Value>> {
        self.entries.get(signature).map(|e| Arc::clone(e.value()))
    }

    /// Store a response. An existing entry for the same signature is kept.
    pub fn put(&self, signature: RequestSignature, response: Arc<Value>) -> Arc<Value> {
        let entry = self.entries.entry(signature).or_insert(response);
        Arc::clone(entry.value())
    }

    pub fn contains(&self, signature: &RequestSignature) -> bool {
        self.entries.contains_key(signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_network_call(&self) {
        self.network_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            network_calls: self.network_calls.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdx_client::CatalogQuery;
    use serde_json::json;

    fn sig(id: &str) -> RequestSignature {
        RequestSignature::from_query(&CatalogQuery::get_dataset(id))
    }

    #[test]
    fn test_get_put() {
        let cache = ResponseCache::new();
        assert!(cache.get(&sig("a")).is_none());

        cache.put(sig("a"), Arc::new(json!({"name": "a"})));
        let value = cache.get(&sig("a")).unwrap();
        assert_eq!(value["name"], "a");

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_first_population_wins() {
        let cache = ResponseCache::new();
        cache.put(sig("a"), Arc::new(json!(1)));
        let kept = cache.put(sig("a"), Arc::new(json!(2)));
        assert_eq!(*kept, json!(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_peek_does_not_count() {
        let cache = ResponseCache::new();
        cache.put(sig("a"), Arc::new(json!(1)));
        assert!(cache.peek(&sig("a")).is_some());
        assert!(cache.peek(&sig("b")).is_none());
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().misses, 0);
    }
}
