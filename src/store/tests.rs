#[cfg(test)]
mod tests {
    use crate::store::partition::PartitionStore;
    use crate::store::types::{DataItem, DataValue};
    use crate::topology::types::KeyRange;
    use std::sync::Arc;

    fn store() -> PartitionStore {
        let store = PartitionStore::new("B", KeyRange::new(200, 399));
        store.seed();
        store
    }

    #[test]
    fn seed_fills_the_whole_interval() {
        let store = store();
        assert_eq!(store.len(), 200);

        let item = store.get(200).unwrap();
        assert_eq!(item.source_node, "B");
        assert_eq!(item.data_type, "string");
        assert_eq!(item.value, DataValue::Text("value_200".to_string()));
    }

    #[test]
    fn get_outside_interval_is_absent() {
        let store = store();
        assert!(store.get(199).is_none());
        assert!(store.get(400).is_none());
    }

    #[test]
    fn repeated_reads_are_identical() {
        let store = store();
        let first = store.get(250).unwrap();
        let second = store.get(250).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn put_replaces_and_reads_back() {
        let store = store();
        store.put(DataItem::text(300, "updated", "B")).unwrap();

        let item = store.get(300).unwrap();
        assert_eq!(item.value, DataValue::Text("updated".to_string()));
    }

    #[test]
    fn put_outside_interval_is_rejected_and_does_not_mutate() {
        let store = store();
        let before = store.len();

        assert!(store.put(DataItem::text(50, "stray", "B")).is_err());
        assert!(store.put(DataItem::text(999, "stray", "B")).is_err());

        assert_eq!(store.len(), before);
        assert!(store.get(50).is_none());
    }

    #[test]
    fn range_scan_clamps_to_the_interval() {
        let store = store();

        // Query [150, 450] against [200, 399] yields exactly [200, 399].
        let items = store.get_range(150, 450);
        assert_eq!(items.len(), 200);
        assert_eq!(items.first().unwrap().key, 200);
        assert_eq!(items.last().unwrap().key, 399);
        assert!(items.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn range_scan_inside_the_interval() {
        let store = store();
        let items = store.get_range(250, 260);
        let keys: Vec<u32> = items.iter().map(|i| i.key).collect();
        assert_eq!(keys, (250..=260).collect::<Vec<u32>>());
    }

    #[test]
    fn disjoint_range_scan_is_empty() {
        let store = store();
        assert!(store.get_range(0, 199).is_empty());
        assert!(store.get_range(400, 999).is_empty());
    }

    #[test]
    fn full_scan_is_ordered_and_complete() {
        let store = store();
        let items = store.get_all();
        assert_eq!(items.len(), 200);
        assert!(items.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[tokio::test]
    async fn concurrent_writes_to_distinct_keys_all_land() {
        let store = Arc::new(PartitionStore::new("B", KeyRange::new(200, 399)));
        store.seed();

        let mut handles = Vec::new();
        for key in 300..340u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put(DataItem::text(key, format!("w_{}", key), "B"))
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for key in 300..340u32 {
            let item = store.get(key).unwrap();
            assert_eq!(item.value, DataValue::Text(format!("w_{}", key)));
        }
    }
}
