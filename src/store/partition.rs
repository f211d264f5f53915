//! The node-local keyed store.
//!
//! Serves reads and writes for keys inside the owning node's interval.
//! Cross-process sharing of the partition is a deployment concern; this
//! store keeps the same contract with an in-process map behind one mutex.

use super::types::DataItem;
use crate::topology::types::KeyRange;
use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

pub struct PartitionStore {
    node_id: String,
    range: KeyRange,
    /// key -> serialized data item, ordered by key.
    entries: Mutex<BTreeMap<u32, String>>,
}

impl PartitionStore {
    pub fn new(node_id: impl Into<String>, range: KeyRange) -> Self {
        Self {
            node_id: node_id.into(),
            range,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Populates the full interval with one synthetic string item per key.
    /// Called once at startup, before the node accepts traffic.
    pub fn seed(&self) {
        let mut entries = self.lock_entries();
        for key in self.range.lo..=self.range.hi {
            let item = DataItem::text(key, format!("value_{}", key), &self.node_id);
            if let Ok(encoded) = serde_json::to_string(&item) {
                entries.insert(key, encoded);
            }
        }
        tracing::info!(
            "Seeded partition [{}, {}] with {} items",
            self.range.lo,
            self.range.hi,
            entries.len()
        );
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn range(&self) -> KeyRange {
        self.range
    }

    pub fn owns(&self, key: u32) -> bool {
        self.range.contains(key)
    }

    /// Returns the item stored under `key`, or `None` when the key is out of
    /// range, absent, or its payload no longer decodes.
    pub fn get(&self, key: u32) -> Option<DataItem> {
        if !self.range.contains(key) {
            return None;
        }
        let entries = self.lock_entries();
        let encoded = entries.get(&key)?;
        decode(key, encoded)
    }

    /// Stores `item` under its key. Rejected when the key falls outside this
    /// node's interval.
    pub fn put(&self, item: DataItem) -> Result<()> {
        if !self.range.contains(item.key) {
            bail!(
                "key {} is outside the local interval [{}, {}]",
                item.key,
                self.range.lo,
                self.range.hi
            );
        }
        let encoded = serde_json::to_string(&item)?;
        self.lock_entries().insert(item.key, encoded);
        Ok(())
    }

    /// Items with `max(qlo, lo) <= k <= min(qhi, hi)`, in key order.
    pub fn get_range(&self, qlo: u32, qhi: u32) -> Vec<DataItem> {
        if !self.range.overlaps(qlo, qhi) {
            return Vec::new();
        }
        let lo = qlo.max(self.range.lo);
        let hi = qhi.min(self.range.hi);
        let entries = self.lock_entries();
        entries
            .range(lo..=hi)
            .filter_map(|(key, encoded)| decode(*key, encoded))
            .collect()
    }

    /// Every item in the node's interval, in key order.
    pub fn get_all(&self) -> Vec<DataItem> {
        let entries = self.lock_entries();
        entries
            .iter()
            .filter_map(|(key, encoded)| decode(*key, encoded))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<u32, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn decode(key: u32, encoded: &str) -> Option<DataItem> {
    match serde_json::from_str(encoded) {
        Ok(item) => Some(item),
        Err(e) => {
            // Undecodable entries are omitted; the enclosing request goes on.
            tracing::warn!("Dropping undecodable item at key {}: {}", key, e);
            None
        }
    }
}
