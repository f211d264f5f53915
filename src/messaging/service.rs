//! In-memory message and subscription tables.

use super::protocol::MessageRequest;
use crate::store::types::now_ms;
use dashmap::DashMap;
use rand::Rng;

pub struct MessageService {
    messages: DashMap<String, MessageRequest>,
    /// subscriber id -> topics, replaced wholesale on re-subscription.
    subscriptions: DashMap<String, Vec<String>>,
}

impl MessageService {
    pub fn new() -> Self {
        Self {
            messages: DashMap::new(),
            subscriptions: DashMap::new(),
        }
    }

    /// Stores one message and returns its generated id.
    pub fn store_message(&self, message: MessageRequest) -> String {
        let message_id = generate_message_id();
        self.messages.insert(message_id.clone(), message);
        message_id
    }

    /// Registers (or replaces) a subscriber's topic list.
    pub fn subscribe(&self, subscriber_id: &str, topics: Vec<String>) {
        self.subscriptions.insert(subscriber_id.to_string(), topics);
    }

    pub fn topics_of(&self, subscriber_id: &str) -> Vec<String> {
        self.subscriptions
            .get(subscriber_id)
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

impl Default for MessageService {
    fn default() -> Self {
        Self::new()
    }
}

/// Short random id of the form `msg_<hex>`, with a timestamp fallback so it
/// is never empty.
fn generate_message_id() -> String {
    let n: u32 = rand::thread_rng().gen_range(1..=0xFF_FFFF);
    let id = format!("msg_{:x}", n);
    if id == "msg_" {
        return format!("msg_{}", now_ms());
    }
    id
}
