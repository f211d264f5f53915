//! Messaging API Handlers
//!
//! HTTP and WebSocket endpoints over the `MessageService`. The two streaming
//! calls follow the same split-socket shape: a `tokio::select!` loop over a
//! timer tick and the inbound frame stream, stopping as soon as the client
//! goes away.

use super::protocol::{
    BatchResponse, ChatMessage, MessageRequest, MessageResponse, SubscriptionRequest, UpdateEvent,
};
use super::service::MessageService;
use crate::store::types::now_ms;
use axum::{
    Json,
    extract::{
        Extension,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

/// Budget for one batch call; messages past it are reported as failures.
const BATCH_DEADLINE: Duration = Duration::from_secs(4);
/// How many update rounds a subscription stream emits before closing.
const SUBSCRIPTION_ROUNDS: u32 = 10;
const SUBSCRIPTION_TICK: Duration = Duration::from_secs(1);

/// Unary send: store the message, answer with its generated id.
pub async fn handle_send_message(
    Extension(service): Extension<Arc<MessageService>>,
    Json(request): Json<MessageRequest>,
) -> (StatusCode, Json<MessageResponse>) {
    let message_id = service.store_message(request);
    tracing::debug!("Stored message {}", message_id);

    (
        StatusCode::OK,
        Json(MessageResponse {
            success: true,
            message_id,
            timestamp_ms: now_ms(),
            error_message: None,
        }),
    )
}

/// Batched send. Messages are processed in order under [`BATCH_DEADLINE`];
/// anything left when the budget expires counts as failed and is named in
/// the error message rather than silently dropped.
pub async fn handle_send_batch(
    Extension(service): Extension<Arc<MessageService>>,
    Json(requests): Json<Vec<MessageRequest>>,
) -> (StatusCode, Json<BatchResponse>) {
    let started = Instant::now();
    let total = requests.len();

    let mut message_ids = Vec::new();
    let mut truncated = 0u32;

    for (index, request) in requests.into_iter().enumerate() {
        if started.elapsed() >= BATCH_DEADLINE {
            truncated = (total - index) as u32;
            tracing::warn!(
                "Batch deadline hit after {} of {} messages",
                index,
                total
            );
            break;
        }
        message_ids.push(service.store_message(request));
    }

    let error_message = (truncated > 0)
        .then(|| format!("deadline exceeded, {} message(s) not processed", truncated));

    (
        StatusCode::OK,
        Json(BatchResponse {
            success_count: message_ids.len() as u32,
            failure_count: truncated,
            message_ids,
            error_message,
            processing_time_ms: started.elapsed().as_millis() as u64,
        }),
    )
}

/// Upgrade to the subscription stream.
pub async fn handle_subscribe(
    ws: WebSocketUpgrade,
    Extension(service): Extension<Arc<MessageService>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_subscription(socket, service))
}

/// Reads the subscription request as the first frame, then pushes one
/// confirmation per topic followed by periodic update rounds. The inbound
/// side is polled every tick so a cancelled client stops the stream
/// promptly.
async fn run_subscription(socket: WebSocket, service: Arc<MessageService>) {
    let (mut sender, mut receiver) = socket.split();

    let request: SubscriptionRequest = loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str(&text) {
                Ok(request) => break request,
                Err(e) => {
                    tracing::debug!("Ignoring malformed subscription frame: {}", e);
                }
            },
            Some(Ok(Message::Close(_))) | None => return,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!("Subscription socket error before setup: {}", e);
                return;
            }
        }
    };

    service.subscribe(&request.subscriber_id, request.topics.clone());
    tracing::info!(
        "Subscriber {} registered for {} topic(s)",
        request.subscriber_id,
        request.topics.len()
    );

    for topic in &request.topics {
        let event = UpdateEvent {
            topic: topic.clone(),
            content: format!("Subscribed to {}", topic),
            timestamp_ms: now_ms(),
        };
        if send_event(&mut sender, &event).await.is_err() {
            return;
        }
    }

    let mut tick = interval(SUBSCRIPTION_TICK);
    tick.tick().await; // the first tick fires immediately

    let mut round = 0;
    while round < SUBSCRIPTION_ROUNDS {
        tokio::select! {
            _ = tick.tick() => {
                for topic in &request.topics {
                    let event = UpdateEvent {
                        topic: topic.clone(),
                        content: format!("Update {} for {}", round, topic),
                        timestamp_ms: now_ms(),
                    };
                    if send_event(&mut sender, &event).await.is_err() {
                        return;
                    }
                }
                round += 1;
            }
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(_)) => return,
                    _ => {}
                }
            }
        }
    }
}

async fn send_event(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &UpdateEvent,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(event).unwrap_or_default();
    sender.send(Message::Text(payload)).await
}

/// Upgrade to the echo chat stream.
pub async fn handle_chat(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(run_chat)
}

/// Echoes every chat frame back with the server as the sender.
async fn run_chat(socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let message: ChatMessage = match serde_json::from_str(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::debug!("Ignoring malformed chat frame: {}", e);
                        continue;
                    }
                };
                let echo = ChatMessage {
                    sender_id: "server".to_string(),
                    content: format!("Echo: {}", message.content),
                    timestamp_ms: now_ms(),
                };
                let payload = serde_json::to_string(&echo).unwrap_or_default();
                if sender.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Ping(data)) => {
                if sender.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }
}
