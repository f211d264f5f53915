//! Peer Gather Handler (non-portal path)
//!
//! Answers internal peer-to-peer data requests: read the local partition,
//! then decide whether the request still has hop budget to travel deeper.
//! Forwarding skips every peer already on the request's traversal path, so
//! the call graph induced by a single request is a DAG even though the
//! overlay itself has cycles.

use super::engine::{Aggregate, QueryEngine, fan_out, lock_aggregate};
use super::protocol::{GatherRequest, GatherResponse, ROUTE_SEPARATOR};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Serves one gather request on this node. Never fails: peer-call errors
/// during forwarding are discarded and the response carries whatever was
/// accumulated when the budget ran out.
pub async fn handle_gather(engine: &QueryEngine, request: GatherRequest) -> GatherResponse {
    let started = Instant::now();
    let self_id = engine.node_id().to_string();
    let route_path = format!("{}{}{}", request.route_path, ROUTE_SEPARATOR, self_id);

    tracing::debug!(
        "Gather {} arrived at {} (hop {}/{}, route {})",
        request.request_id,
        self_id,
        request.hop_count,
        request.max_hops,
        route_path
    );

    let mut aggregate = Aggregate::new(&self_id);
    aggregate.absorb_items(engine.local_read(&request));

    let should_forward = request.forward_to_peers
        && request.hop_count + 1 < request.max_hops
        && !engine.registry.is_empty();

    let (items, contributing_nodes) = if should_forward {
        let forwarded = request.forwarded(&self_id);
        let aggregate = Arc::new(Mutex::new(aggregate));
        fan_out(
            &engine.registry,
            &forwarded,
            &aggregate,
            engine.config.peer_call_deadline,
            engine.config.query_deadline,
        )
        .await;
        let parts = lock_aggregate(&aggregate).take_parts();
        parts
    } else {
        aggregate.take_parts()
    };

    GatherResponse {
        request_id: request.request_id,
        success: true,
        error_message: None,
        items,
        responder_id: self_id,
        route_path,
        processing_time_ms: started.elapsed().as_millis() as u64,
        contributing_nodes,
    }
}
