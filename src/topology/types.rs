use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Closed integer interval `[lo, hi]` owned by a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub lo: u32,
    pub hi: u32,
}

impl KeyRange {
    pub fn new(lo: u32, hi: u32) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, key: u32) -> bool {
        self.lo <= key && key <= self.hi
    }

    /// True when `[lo, hi]` and this interval share at least one key.
    pub fn overlaps(&self, lo: u32, hi: u32) -> bool {
        lo <= self.hi && hi >= self.lo
    }

    pub fn len(&self) -> usize {
        (self.hi - self.lo + 1) as usize
    }
}

/// A single node of the overlay. Immutable after the topology loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Short identifier, e.g. "A".
    pub id: String,
    /// Nodes in the same host group resolve to loopback; others resolve to
    /// the externally supplied remote address.
    pub host_group: u32,
    /// TCP port the node's HTTP API listens on.
    pub port: u16,
    /// Peer ids this node dials at startup.
    pub connects_to: Vec<String>,
    /// The key interval this node owns.
    pub range: KeyRange,
}

// --- Configuration document ---
//
// The on-disk JSON shape. Parsed with serde and converted into the validated
// `Topology` in `model.rs`.

#[derive(Debug, Deserialize)]
pub struct TopologyDoc {
    pub nodes: HashMap<String, NodeEntry>,
    pub portal: String,
    pub shared_memory_key: String,
    pub cache_size: usize,
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct NodeEntry {
    pub host_group: u32,
    pub port: u16,
    #[serde(default)]
    pub connects_to: Vec<String>,
    /// `[lo, hi]`, both inclusive.
    pub data_range: [u32; 2],
}
