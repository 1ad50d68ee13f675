//! TTL + LRU response cache, keyed by SHA-256 of the normalized question.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use super::schemas::QueryResponse;

struct Entry {
    value: QueryResponse,
    inserted_at: Instant,
}

/// A TTL + LRU cache over built [`QueryResponse`]s.
///
/// `get` evicts the entry if its TTL has expired; otherwise it is promoted
/// to most-recently-used. `set` inserts as MRU and evicts the LRU entry
/// while the cache exceeds `max_size`.
pub struct TtlLruCache {
    ttl: Duration,
    max_size: usize,
    entries: Mutex<HashMap<String, Entry>>,
    /// Insertion/access order, most-recently-used at the back.
    order: Mutex<Vec<String>>,
}

impl TtlLruCache {
    /// Builds an empty cache with the given TTL and max entry count.
    #[must_use]
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self { ttl, max_size, entries: Mutex::new(HashMap::new()), order: Mutex::new(Vec::new()) }
    }

    /// Computes the cache key for `question`: SHA-256 of its trimmed,
    /// lowercased form.
    #[must_use]
    pub fn key_for(question: &str) -> String {
        let normalized = question.trim().to_lowercase();
        let digest = Sha256::digest(normalized.as_bytes());
        format!("{digest:x}")
    }

    /// Returns the cached response for `key`, if present and unexpired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<QueryResponse> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let expired = match entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => return None,
        };

        if expired {
            entries.remove(key);
            self.remove_from_order(key);
            return None;
        }

        self.touch(key);
        entries.get(key).map(|e| e.value.clone())
    }

    /// Inserts `value` under `key` as most-recently-used, evicting the
    /// least-recently-used entry while over `max_size`.
    pub fn set(&self, key: String, value: QueryResponse) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.clone(), Entry { value, inserted_at: Instant::now() });
        drop(entries);

        self.touch(&key);

        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut order = self.order.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        while entries.len() > self.max_size {
            if order.is_empty() {
                break;
            }
            let lru = order.remove(0);
            entries.remove(&lru);
        }
    }

    /// Wipes every entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
        self.order.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
    }

    fn touch(&self, key: &str) {
        let mut order = self.order.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        order.retain(|k| k != key);
        order.push(key.to_string());
    }

    fn remove_from_order(&self, key: &str) {
        let mut order = self.order.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        order.retain(|k| k != key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::schemas::AgentMetadata;

    fn sample_response(answer: &str) -> QueryResponse {
        QueryResponse {
            answer: answer.to_string(),
            sources: Vec::new(),
            agent_metadata: AgentMetadata {
                domain: "legal".to_string(),
                specialist_used: "legal".to_string(),
                documents_retrieved: 1,
                documents_filtered: 1,
                revision_count: 0,
                audit_result: "pass".to_string(),
                quant_analysis: None,
                risk_assessment: None,
            },
        }
    }

    #[test]
    fn test_key_for_normalizes_question() {
        assert_eq!(TtlLruCache::key_for("  Hello World  "), TtlLruCache::key_for("hello world"));
    }

    #[test]
    fn test_set_then_get_hits() {
        let cache = TtlLruCache::new(Duration::from_secs(60), 10);
        let key = TtlLruCache::key_for("q1");
        cache.set(key.clone(), sample_response("a1"));
        assert_eq!(cache.get(&key).unwrap().answer, "a1");
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = TtlLruCache::new(Duration::from_millis(0), 10);
        let key = TtlLruCache::key_for("q1");
        cache.set(key.clone(), sample_response("a1"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_lru_eviction_past_max_size() {
        let cache = TtlLruCache::new(Duration::from_secs(60), 2);
        let k1 = TtlLruCache::key_for("q1");
        let k2 = TtlLruCache::key_for("q2");
        let k3 = TtlLruCache::key_for("q3");
        cache.set(k1.clone(), sample_response("a1"));
        cache.set(k2.clone(), sample_response("a2"));
        cache.set(k3.clone(), sample_response("a3"));
        assert!(cache.get(&k1).is_none());
        assert!(cache.get(&k2).is_some());
        assert!(cache.get(&k3).is_some());
    }

    #[test]
    fn test_clear_wipes_everything() {
        let cache = TtlLruCache::new(Duration::from_secs(60), 10);
        let key = TtlLruCache::key_for("q1");
        cache.set(key.clone(), sample_response("a1"));
        cache.clear();
        assert!(cache.get(&key).is_none());
    }
}
