#[cfg(test)]
mod tests {
    use crate::cache::query_cache::QueryCache;
    use crate::overlay::protocol::QueryResponse;
    use crate::store::types::{DataItem, now_ms};
    use std::time::Duration;

    fn response(query_id: &str) -> QueryResponse {
        QueryResponse {
            query_id: query_id.to_string(),
            success: true,
            error_message: None,
            results: vec![DataItem::text(5, "value_5", "A")],
            contributing_nodes: vec!["A".to_string()],
            timestamp_ms: now_ms(),
            processing_time_ms: 3,
            from_cache: false,
        }
    }

    #[test]
    fn miss_on_empty_cache() {
        let cache = QueryCache::new(10, Duration::from_secs(60));
        assert!(cache.lookup("q1").is_none());
    }

    #[test]
    fn hit_returns_copy_marked_from_cache() {
        let cache = QueryCache::new(10, Duration::from_secs(60));
        let original = response("q1");
        cache.insert("q1", original.clone());

        let hit = cache.lookup("q1").unwrap();
        assert!(hit.from_cache);
        assert_eq!(hit.query_id, "q1");
        assert_eq!(hit.results, original.results);

        // The stored entry keeps its original flag; every hit is re-marked.
        let again = cache.lookup("q1").unwrap();
        assert!(again.from_cache);
    }

    #[test]
    fn unknown_id_misses_even_when_cache_is_populated() {
        let cache = QueryCache::new(10, Duration::from_secs(60));
        cache.insert("q1", response("q1"));
        assert!(cache.lookup("q2").is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = QueryCache::new(10, Duration::from_millis(50));
        cache.insert("q1", response("q1"));
        assert!(cache.lookup("q1").is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.lookup("q1").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn capacity_bound_drops_the_oldest_entries() {
        let cache = QueryCache::new(3, Duration::from_secs(60));
        for i in 0..5 {
            let id = format!("q{}", i);
            cache.insert(id.clone(), response(&id));
        }

        assert_eq!(cache.len(), 3);
        // The two oldest are gone, the three newest remain.
        assert!(cache.lookup("q0").is_none());
        assert!(cache.lookup("q1").is_none());
        assert!(cache.lookup("q2").is_some());
        assert!(cache.lookup("q3").is_some());
        assert!(cache.lookup("q4").is_some());
    }

    #[tokio::test]
    async fn expired_entries_do_not_count_against_capacity() {
        let cache = QueryCache::new(2, Duration::from_millis(40));
        cache.insert("old1", response("old1"));
        cache.insert("old2", response("old2"));

        tokio::time::sleep(Duration::from_millis(70)).await;

        cache.insert("fresh1", response("fresh1"));
        cache.insert("fresh2", response("fresh2"));
        assert_eq!(cache.len(), 2);
        assert!(cache.lookup("fresh1").is_some());
        assert!(cache.lookup("fresh2").is_some());
    }
}
