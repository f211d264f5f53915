//! Distributed Query Engine (portal path)
//!
//! Orchestrates a client query end to end: cache lookup, local partition
//! read, concurrent peer fan-out under a hard time budget, aggregation, and
//! cache insert.
//!
//! ## Deadlines
//! - Each outbound gather call carries its own deadline
//!   (`peer_call_deadline`).
//! - The peer phase as a whole is bounded by what remains of
//!   `query_deadline`; calls still outstanding when the budget runs out are
//!   aborted and their late answers never reach the aggregate.
//!
//! Peer failures of any kind degrade the result set instead of failing the
//! query: the portal answers successfully with whatever it gathered.

use super::peers::PeerRegistry;
use super::protocol::{
    GatherRequest, GatherResponse, MAX_HOPS, PEER_CALL_DEADLINE, QUERY_DEADLINE, QueryKind,
    QueryRequest, QueryResponse,
};
use crate::cache::query_cache::QueryCache;
use crate::store::partition::PartitionStore;
use crate::store::types::{DataItem, now_ms};
use crate::topology::types::NodeDescriptor;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Tunable limits of the query engine. Production uses the protocol
/// defaults; tests tighten them.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub max_hops: u32,
    /// Overall budget for a request, including its peer phase.
    pub query_deadline: Duration,
    /// Deadline for one outbound gather call.
    pub peer_call_deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_hops: MAX_HOPS,
            query_deadline: QUERY_DEADLINE,
            peer_call_deadline: PEER_CALL_DEADLINE,
        }
    }
}

/// Per-request result accumulator. Shared by the fan-out tasks behind one
/// mutex; peer responses merge one at a time.
///
/// Merging is keyed: an item whose key has already been absorbed is skipped,
/// so diamond-shaped traversals (two branches reaching the same node) cannot
/// duplicate a partition's contribution.
pub(crate) struct Aggregate {
    items: Vec<DataItem>,
    seen_keys: HashSet<u32>,
    contributors: BTreeSet<String>,
}

impl Aggregate {
    pub(crate) fn new(self_id: &str) -> Self {
        let mut contributors = BTreeSet::new();
        contributors.insert(self_id.to_string());
        Self {
            items: Vec::new(),
            seen_keys: HashSet::new(),
            contributors,
        }
    }

    pub(crate) fn absorb_items(&mut self, items: Vec<DataItem>) {
        for item in items {
            if self.seen_keys.insert(item.key) {
                self.items.push(item);
            }
        }
    }

    pub(crate) fn absorb_response(&mut self, response: GatherResponse) {
        self.contributors.extend(response.contributing_nodes);
        self.absorb_items(response.items);
    }

    pub(crate) fn take_parts(&mut self) -> (Vec<DataItem>, Vec<String>) {
        (
            std::mem::take(&mut self.items),
            std::mem::take(&mut self.contributors).into_iter().collect(),
        )
    }
}

pub struct QueryEngine {
    pub(crate) node: NodeDescriptor,
    pub(crate) is_portal: bool,
    pub(crate) store: Arc<PartitionStore>,
    pub(crate) cache: Arc<QueryCache>,
    pub(crate) registry: Arc<PeerRegistry>,
    pub(crate) config: EngineConfig,
}

impl QueryEngine {
    pub fn new(
        node: NodeDescriptor,
        is_portal: bool,
        store: Arc<PartitionStore>,
        cache: Arc<QueryCache>,
        registry: Arc<PeerRegistry>,
        config: EngineConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            node,
            is_portal,
            store,
            cache,
            registry,
            config,
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node.id
    }

    pub fn node(&self) -> &NodeDescriptor {
        &self.node
    }

    pub fn is_portal(&self) -> bool {
        self.is_portal
    }

    pub fn store(&self) -> &PartitionStore {
        &self.store
    }

    pub fn peer_ids(&self) -> Vec<String> {
        self.registry.iter().map(|p| p.id().to_string()).collect()
    }

    /// The portal's client-query procedure. Non-portal nodes refuse without
    /// touching the store or the network.
    pub async fn execute_query(&self, query: QueryRequest) -> QueryResponse {
        let started = Instant::now();

        if !self.is_portal {
            tracing::debug!(
                "Refusing client query {} on non-portal node {}",
                query.query_id,
                self.node.id
            );
            return failure(&query.query_id, "not portal", started);
        }

        if let Some(reason) = validate(&query) {
            tracing::debug!("Rejecting malformed query {}: {}", query.query_id, reason);
            return failure(&query.query_id, reason, started);
        }

        if let Some(mut hit) = self.cache.lookup(&query.query_id) {
            tracing::debug!("Cache hit for query {}", query.query_id);
            hit.processing_time_ms = started.elapsed().as_millis() as u64;
            return hit;
        }

        let mut gather = GatherRequest::from_query(&query, &self.node.id);
        gather.max_hops = self.config.max_hops;

        let mut aggregate = Aggregate::new(&self.node.id);
        aggregate.absorb_items(self.local_read(&gather));

        let elapsed = started.elapsed();
        if elapsed >= self.config.query_deadline {
            tracing::warn!(
                "Query {} spent its whole budget locally; skipping the peer phase",
                query.query_id
            );
        } else if !self.registry.is_empty() {
            let aggregate = Arc::new(Mutex::new(aggregate));
            fan_out(
                &self.registry,
                &gather,
                &aggregate,
                self.config.peer_call_deadline,
                self.config.query_deadline - elapsed,
            )
            .await;
            let (results, contributing_nodes) = lock_aggregate(&aggregate).take_parts();
            return self.finish_query(&query.query_id, results, contributing_nodes, started);
        }

        let (results, contributing_nodes) = aggregate.take_parts();
        self.finish_query(&query.query_id, results, contributing_nodes, started)
    }

    fn finish_query(
        &self,
        query_id: &str,
        results: Vec<DataItem>,
        contributing_nodes: Vec<String>,
        started: Instant,
    ) -> QueryResponse {
        let response = QueryResponse {
            query_id: query_id.to_string(),
            success: true,
            error_message: None,
            results,
            contributing_nodes,
            timestamp_ms: now_ms(),
            processing_time_ms: started.elapsed().as_millis() as u64,
            from_cache: false,
        };
        self.cache.insert(query_id, response.clone());
        tracing::info!(
            "Query {} answered with {} items in {} ms",
            query_id,
            response.results.len(),
            response.processing_time_ms
        );
        response
    }

    /// Executes the kind-specific read against the local partition. `write`
    /// stores a fresh item when this node owns the key and is a no-op
    /// otherwise.
    pub(crate) fn local_read(&self, request: &GatherRequest) -> Vec<DataItem> {
        match request.kind {
            QueryKind::Exact => match request.key {
                Some(key) => self.store.get(key).into_iter().collect(),
                None => Vec::new(),
            },
            QueryKind::Range => match (request.range_start, request.range_end) {
                (Some(lo), Some(hi)) => self.store.get_range(lo, hi),
                _ => Vec::new(),
            },
            QueryKind::All => self.store.get_all(),
            QueryKind::Write => self.local_write(request),
        }
    }

    fn local_write(&self, request: &GatherRequest) -> Vec<DataItem> {
        let (Some(key), Some(value)) = (request.key, request.write_value()) else {
            return Vec::new();
        };
        if !self.store.owns(key) {
            return Vec::new();
        }

        let item = DataItem::text(key, value, &self.node.id);
        match self.store.put(item.clone()) {
            Ok(()) => vec![item],
            Err(e) => {
                // Omit the item, keep the request going.
                tracing::error!("Local write for key {} failed: {}", key, e);
                Vec::new()
            }
        }
    }
}

/// Dispatches one concurrent gather call per eligible, unvisited peer and
/// merges completed successful answers into `aggregate`. Returns once every
/// call finished or `wait_budget` ran out, whichever comes first; remaining
/// calls are aborted.
pub(crate) async fn fan_out(
    registry: &Arc<PeerRegistry>,
    request: &GatherRequest,
    aggregate: &Arc<Mutex<Aggregate>>,
    peer_call_deadline: Duration,
    wait_budget: Duration,
) {
    let mut tasks = JoinSet::new();

    for peer in registry.iter() {
        if request.visited_nodes.iter().any(|id| id == peer.id()) {
            tracing::debug!("Skipping visited peer {}", peer.id());
            continue;
        }
        // A peer that will forward the request can reach data it does not
        // own; the interval filter only prunes leaf calls.
        if !request.receiver_can_forward() && !request.peer_can_contribute(&peer.node.range) {
            tracing::debug!(
                "Peer {} cannot contribute to request {}",
                peer.id(),
                request.request_id
            );
            continue;
        }

        let peer = peer.clone();
        let request = request.clone();
        let aggregate = aggregate.clone();
        tasks.spawn(async move {
            match peer.gather(&request, peer_call_deadline).await {
                Ok(response) if response.success => {
                    lock_aggregate(&aggregate).absorb_response(response);
                }
                Ok(response) => {
                    tracing::warn!(
                        "Peer {} answered request {} unsuccessfully: {:?}",
                        peer.id(),
                        request.request_id,
                        response.error_message
                    );
                }
                Err(e) => {
                    tracing::warn!("Gather call to peer {} failed: {}", peer.id(), e);
                }
            }
        });
    }

    let deadline = tokio::time::Instant::now() + wait_budget;
    loop {
        match tokio::time::timeout_at(deadline, tasks.join_next()).await {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    "Peer wait budget spent on request {}; abandoning {} outstanding call(s)",
                    request.request_id,
                    tasks.len()
                );
                tasks.abort_all();
                break;
            }
        }
    }
}

pub(crate) fn lock_aggregate(aggregate: &Arc<Mutex<Aggregate>>) -> std::sync::MutexGuard<'_, Aggregate> {
    aggregate.lock().unwrap_or_else(PoisonError::into_inner)
}

fn validate(query: &QueryRequest) -> Option<&'static str> {
    match query.kind {
        QueryKind::Exact if query.key.is_none() => Some("exact query requires a key"),
        QueryKind::Range if query.range_start.is_none() || query.range_end.is_none() => {
            Some("range query requires range_start and range_end")
        }
        QueryKind::Write if query.key.is_none() => Some("write query requires a key"),
        QueryKind::Write if query.parameter.is_none() => Some("write query requires a parameter"),
        _ => None,
    }
}

fn failure(query_id: &str, error: &str, started: Instant) -> QueryResponse {
    QueryResponse {
        query_id: query_id.to_string(),
        success: false,
        error_message: Some(error.to_string()),
        results: Vec::new(),
        contributing_nodes: Vec::new(),
        timestamp_ms: now_ms(),
        processing_time_ms: started.elapsed().as_millis() as u64,
        from_cache: false,
    }
}
