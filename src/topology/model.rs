//! Validated overlay topology.
//!
//! Converts the raw configuration document into an immutable `Topology` and
//! rejects every document that violates the partitioning invariants. All
//! routing decisions downstream (owner lookup, peer eligibility) read from
//! this structure without locking.

use super::types::{KeyRange, NodeDescriptor, TopologyDoc};
use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub struct Topology {
    nodes: HashMap<String, NodeDescriptor>,
    portal: String,
    shared_memory_key: String,
    cache_size: usize,
    cache_ttl: Duration,
}

impl Topology {
    /// Reads and validates a topology document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read topology file {:?}", path.as_ref()))?;
        let doc: TopologyDoc =
            serde_json::from_str(&raw).context("failed to parse topology document")?;
        Self::from_document(doc)
    }

    /// Validates a parsed document. Fails on the first violated invariant:
    /// empty node table, inverted or overlapping intervals, gaps in the key
    /// space, unknown peer or portal ids, or non-positive cache settings.
    pub fn from_document(doc: TopologyDoc) -> Result<Self> {
        if doc.nodes.is_empty() {
            bail!("topology has no nodes");
        }
        if doc.cache_size == 0 {
            bail!("cache_size must be > 0");
        }
        if doc.cache_ttl_seconds == 0 {
            bail!("cache_ttl_seconds must be > 0");
        }

        let mut nodes = HashMap::new();
        for (id, entry) in doc.nodes {
            let [lo, hi] = entry.data_range;
            if lo > hi {
                bail!("node {} has inverted data_range [{}, {}]", id, lo, hi);
            }
            nodes.insert(
                id.clone(),
                NodeDescriptor {
                    id,
                    host_group: entry.host_group,
                    port: entry.port,
                    connects_to: entry.connects_to,
                    range: KeyRange::new(lo, hi),
                },
            );
        }

        for node in nodes.values() {
            for peer_id in &node.connects_to {
                if !nodes.contains_key(peer_id) {
                    bail!("node {} connects to unknown node {}", node.id, peer_id);
                }
                if peer_id == &node.id {
                    bail!("node {} connects to itself", node.id);
                }
            }
        }

        if !nodes.contains_key(&doc.portal) {
            bail!("portal {} is not in the node table", doc.portal);
        }

        // Disjointness and coverage: sorted by lo, each interval must start
        // exactly one past the previous hi.
        let mut ranges: Vec<(&str, KeyRange)> = nodes
            .values()
            .map(|n| (n.id.as_str(), n.range))
            .collect();
        ranges.sort_by_key(|(_, r)| r.lo);
        for window in ranges.windows(2) {
            let (prev_id, prev) = window[0];
            let (next_id, next) = window[1];
            if next.lo <= prev.hi {
                bail!(
                    "key intervals of {} and {} overlap ([{}, {}] vs [{}, {}])",
                    prev_id,
                    next_id,
                    prev.lo,
                    prev.hi,
                    next.lo,
                    next.hi
                );
            }
            if next.lo != prev.hi + 1 {
                bail!(
                    "key space gap between {} (ends {}) and {} (starts {})",
                    prev_id,
                    prev.hi,
                    next_id,
                    next.lo
                );
            }
        }

        Ok(Self {
            nodes,
            portal: doc.portal,
            shared_memory_key: doc.shared_memory_key,
            cache_size: doc.cache_size,
            cache_ttl: Duration::from_secs(doc.cache_ttl_seconds),
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes.values()
    }

    pub fn node(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes.get(id)
    }

    /// The peers the given node dials, in `connects_to` order.
    pub fn peers_of(&self, id: &str) -> Vec<&NodeDescriptor> {
        match self.nodes.get(id) {
            Some(node) => node
                .connects_to
                .iter()
                .filter_map(|peer_id| self.nodes.get(peer_id))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn portal(&self) -> &NodeDescriptor {
        // Validated in from_document.
        &self.nodes[&self.portal]
    }

    pub fn is_portal(&self, id: &str) -> bool {
        self.portal == id
    }

    pub fn shared_store_key(&self) -> &str {
        &self.shared_memory_key
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_size
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// The unique node whose interval contains `key`.
    pub fn owner_of(&self, key: u32) -> Option<&NodeDescriptor> {
        self.nodes.values().find(|n| n.range.contains(key))
    }

    /// Every node whose interval intersects `[lo, hi]`.
    pub fn nodes_overlapping(&self, lo: u32, hi: u32) -> Vec<&NodeDescriptor> {
        self.nodes
            .values()
            .filter(|n| n.range.overlaps(lo, hi))
            .collect()
    }
}
