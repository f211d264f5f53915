//! Overlay Network Protocol
//!
//! Endpoints and DTOs for the query surface: the external client query
//! accepted by the portal and the internal gather request that fans out
//! between peers. Everything is serialized as JSON and carried over HTTP.

use crate::store::types::DataItem;
use crate::topology::types::KeyRange;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// --- API Endpoints ---

/// Public endpoint for client queries. Only the portal answers it.
pub const ENDPOINT_QUERY: &str = "/query";
/// Internal endpoint for peer-to-peer data gathering.
pub const ENDPOINT_GATHER: &str = "/internal/gather";

// --- Protocol constants ---

/// Maximum number of peer-to-peer forwarding steps on a single request.
pub const MAX_HOPS: u32 = 3;
/// Overall budget for one request's peer phase.
pub const QUERY_DEADLINE: Duration = Duration::from_secs(4);
/// Timeout for a single outbound gather call.
pub const PEER_CALL_DEADLINE: Duration = Duration::from_secs(5);
/// Separator for the human-readable traversal path, e.g. "A->B->D".
pub const ROUTE_SEPARATOR: &str = "->";
/// Context key carrying the value of a `write` query across gather hops.
pub const CONTEXT_WRITE_VALUE: &str = "write_value";

// --- Data Transfer Objects ---

/// What a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// One key; `key` must be set.
    Exact,
    /// All keys in `[range_start, range_end]`, both inclusive.
    Range,
    /// Every key in the designed space.
    All,
    /// Store `parameter` as a new string item under `key`.
    Write,
}

/// External client query, addressed to the portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Client-chosen id; doubles as the cache key and the gather request id.
    pub query_id: String,
    pub client_id: String,
    pub kind: QueryKind,
    #[serde(default)]
    pub key: Option<u32>,
    #[serde(default)]
    pub range_start: Option<u32>,
    #[serde(default)]
    pub range_end: Option<u32>,
    /// Value for `write` queries.
    #[serde(default)]
    pub parameter: Option<String>,
    pub timestamp_ms: u64,
}

/// Portal response to a client query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query_id: String,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    pub results: Vec<DataItem>,
    /// Every node whose data appears in `results`.
    pub contributing_nodes: Vec<String>,
    pub timestamp_ms: u64,
    pub processing_time_ms: u64,
    /// Set iff the entire result was served from the cache.
    pub from_cache: bool,
}

/// Internal overlay request: a query plus the traversal bookkeeping that
/// bounds the fan-out and prevents cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatherRequest {
    pub request_id: String,
    pub requester_id: String,
    pub kind: QueryKind,
    #[serde(default)]
    pub key: Option<u32>,
    #[serde(default)]
    pub range_start: Option<u32>,
    #[serde(default)]
    pub range_end: Option<u32>,
    pub timestamp_ms: u64,
    /// Forwarding steps taken so far; starts at 0 on the portal.
    pub hop_count: u32,
    pub max_hops: u32,
    /// Node ids traversed so far, joined by [`ROUTE_SEPARATOR`].
    pub route_path: String,
    /// False once the hop budget is spent; leaf peers answer locally only.
    pub forward_to_peers: bool,
    /// Every node id on the traversed path. A peer already listed here is
    /// never called again, which keeps the call graph acyclic.
    pub visited_nodes: Vec<String>,
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl GatherRequest {
    /// The portal-originated request derived from a client query.
    pub fn from_query(query: &QueryRequest, portal_id: &str) -> Self {
        let mut context = HashMap::new();
        if let Some(parameter) = &query.parameter {
            context.insert(CONTEXT_WRITE_VALUE.to_string(), parameter.clone());
        }
        Self {
            request_id: query.query_id.clone(),
            requester_id: portal_id.to_string(),
            kind: query.kind,
            key: query.key,
            range_start: query.range_start,
            range_end: query.range_end,
            timestamp_ms: query.timestamp_ms,
            hop_count: 0,
            max_hops: MAX_HOPS,
            route_path: portal_id.to_string(),
            forward_to_peers: true,
            visited_nodes: vec![portal_id.to_string()],
            context,
        }
    }

    /// The request this node forwards one hop deeper: hop counter bumped,
    /// this node appended to the route and to the visited set.
    pub fn forwarded(&self, self_id: &str) -> Self {
        let mut next = self.clone();
        next.hop_count += 1;
        next.requester_id = self_id.to_string();
        next.route_path = format!("{}{}{}", self.route_path, ROUTE_SEPARATOR, self_id);
        if !next.visited_nodes.iter().any(|id| id == self_id) {
            next.visited_nodes.push(self_id.to_string());
        }
        next
    }

    /// Whether the node receiving this request will still have hop budget
    /// to forward it. A peer that forwards is worth calling even when its
    /// own interval cannot match; a leaf peer is only called when
    /// [`peer_can_contribute`](Self::peer_can_contribute) holds.
    pub fn receiver_can_forward(&self) -> bool {
        self.forward_to_peers && self.hop_count + 1 < self.max_hops
    }

    /// Whether a peer owning `range` could hold data matching this request.
    /// `all` and `write` requests are always worth sending; `exact` and
    /// `range` only when the key material intersects the peer's interval.
    pub fn peer_can_contribute(&self, range: &KeyRange) -> bool {
        match self.kind {
            QueryKind::Exact => self.key.map(|k| range.contains(k)).unwrap_or(false),
            QueryKind::Range => match (self.range_start, self.range_end) {
                (Some(lo), Some(hi)) => range.overlaps(lo, hi),
                _ => false,
            },
            QueryKind::All | QueryKind::Write => true,
        }
    }

    /// The `write` payload, when this request carries one.
    pub fn write_value(&self) -> Option<&str> {
        self.context.get(CONTEXT_WRITE_VALUE).map(String::as_str)
    }
}

/// Peer answer to a gather request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatherResponse {
    pub request_id: String,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    pub items: Vec<DataItem>,
    pub responder_id: String,
    /// The traversal path as observed by the responder.
    pub route_path: String,
    pub processing_time_ms: u64,
    /// The responder plus every deeper node whose data appears in `items`.
    pub contributing_nodes: Vec<String>,
}
