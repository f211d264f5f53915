//! Messaging Protocol
//!
//! Endpoints and DTOs for the pass-through messaging RPCs.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Unary message send.
pub const ENDPOINT_MESSAGE: &str = "/message";
/// Batched message send (the client-streaming call collapsed to one body).
pub const ENDPOINT_MESSAGE_BATCH: &str = "/message/batch";
/// WebSocket endpoint streaming topic updates to a subscriber.
pub const ENDPOINT_SUBSCRIBE: &str = "/subscribe";
/// WebSocket endpoint echoing chat messages.
pub const ENDPOINT_CHAT: &str = "/chat";

// --- Data Transfer Objects ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub timestamp_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message_id: String,
    pub timestamp_ms: u64,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success_count: u32,
    pub failure_count: u32,
    pub message_ids: Vec<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub processing_time_ms: u64,
}

/// First frame a subscriber sends after the WebSocket upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub subscriber_id: String,
    pub topics: Vec<String>,
}

/// One server-pushed subscription event.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub topic: String,
    pub content: String,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_id: String,
    pub content: String,
    pub timestamp_ms: u64,
}
