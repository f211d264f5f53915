//! Overlay API Handlers
//!
//! The bridge between the Axum router and the query engine. Both endpoints
//! answer HTTP 200 with the protocol-level outcome inside the body; routing
//! refusals and degraded results are not transport errors.

use super::engine::QueryEngine;
use super::gather::handle_gather as gather;
use super::protocol::{GatherRequest, GatherResponse, QueryRequest, QueryResponse};
use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;

/// Client query endpoint. Only the portal produces results; any other node
/// refuses inside the response body.
pub async fn handle_query(
    Extension(engine): Extension<Arc<QueryEngine>>,
    Json(request): Json<QueryRequest>,
) -> (StatusCode, Json<QueryResponse>) {
    (StatusCode::OK, Json(engine.execute_query(request).await))
}

/// Internal overlay endpoint, accepted by every node.
pub async fn handle_gather(
    Extension(engine): Extension<Arc<QueryEngine>>,
    Json(request): Json<GatherRequest>,
) -> (StatusCode, Json<GatherResponse>) {
    (StatusCode::OK, Json(gather(&engine, request).await))
}
