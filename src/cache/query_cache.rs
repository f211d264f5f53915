use crate::overlay::protocol::QueryResponse;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct CacheEntry {
    query_id: String,
    response: QueryResponse,
    inserted_at: Instant,
}

/// Bounded, TTL-expiring cache of portal query responses.
///
/// Eviction is oldest-insertion-first: when the cache is full the entry that
/// has been resident longest is dropped, regardless of how recently it was
/// read. Both operations take the single internal lock.
pub struct QueryCache {
    capacity: usize,
    ttl: Duration,
    entries: Mutex<VecDeque<CacheEntry>>,
}

impl QueryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Returns a copy of the cached response for `query_id`, marked
    /// `from_cache`, or `None` when no live entry matches.
    pub fn lookup(&self, query_id: &str) -> Option<QueryResponse> {
        let mut entries = self.lock_entries();
        Self::evict_expired(&mut entries, self.ttl);

        entries.iter().find(|e| e.query_id == query_id).map(|e| {
            let mut response = e.response.clone();
            response.from_cache = true;
            response
        })
    }

    /// Records a freshly computed response. Expired entries are purged
    /// first; if the cache is still at capacity the oldest entry is dropped.
    pub fn insert(&self, query_id: impl Into<String>, response: QueryResponse) {
        let mut entries = self.lock_entries();
        Self::evict_expired(&mut entries, self.ttl);

        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(CacheEntry {
            query_id: query_id.into(),
            response,
            inserted_at: Instant::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    fn evict_expired(entries: &mut VecDeque<CacheEntry>, ttl: Duration) {
        entries.retain(|e| e.inserted_at.elapsed() <= ttl);
    }

    fn lock_entries(&self) -> MutexGuard<'_, VecDeque<CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
