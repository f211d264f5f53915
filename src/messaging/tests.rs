#[cfg(test)]
mod tests {
    use crate::messaging::handlers::{handle_send_batch, handle_send_message};
    use crate::messaging::protocol::MessageRequest;
    use crate::messaging::service::MessageService;
    use crate::store::types::now_ms;
    use axum::{Json, extract::Extension};
    use std::sync::Arc;

    fn message(content: &str) -> MessageRequest {
        MessageRequest {
            sender_id: "alice".to_string(),
            receiver_id: "bob".to_string(),
            content: content.to_string(),
            timestamp_ms: now_ms(),
        }
    }

    #[test]
    fn stored_messages_get_distinct_ids() {
        let service = MessageService::new();

        let first = service.store_message(message("hello"));
        let second = service.store_message(message("world"));

        assert!(first.starts_with("msg_"));
        assert!(second.starts_with("msg_"));
        assert_eq!(service.message_count(), 2);
    }

    #[test]
    fn resubscribing_replaces_the_topic_list() {
        let service = MessageService::new();

        service.subscribe("alice", vec!["alerts".to_string(), "news".to_string()]);
        assert_eq!(service.topics_of("alice").len(), 2);

        service.subscribe("alice", vec!["news".to_string()]);
        assert_eq!(service.topics_of("alice"), vec!["news"]);

        assert!(service.topics_of("nobody").is_empty());
    }

    #[tokio::test]
    async fn unary_send_answers_with_the_generated_id() {
        let service = Arc::new(MessageService::new());

        let (_, Json(response)) =
            handle_send_message(Extension(service.clone()), Json(message("hello"))).await;

        assert!(response.success);
        assert!(response.message_id.starts_with("msg_"));
        assert!(response.error_message.is_none());
        assert_eq!(service.message_count(), 1);
    }

    #[tokio::test]
    async fn batch_send_reports_per_message_outcomes() {
        let service = Arc::new(MessageService::new());
        let batch: Vec<MessageRequest> = (0..5).map(|i| message(&format!("m{}", i))).collect();

        let (_, Json(response)) =
            handle_send_batch(Extension(service.clone()), Json(batch)).await;

        assert_eq!(response.success_count, 5);
        assert_eq!(response.failure_count, 0);
        assert_eq!(response.message_ids.len(), 5);
        assert!(response.error_message.is_none());
        assert_eq!(service.message_count(), 5);
    }

    #[tokio::test]
    async fn empty_batch_is_a_clean_no_op() {
        let service = Arc::new(MessageService::new());

        let (_, Json(response)) = handle_send_batch(Extension(service), Json(Vec::new())).await;

        assert_eq!(response.success_count, 0);
        assert_eq!(response.failure_count, 0);
        assert!(response.message_ids.is_empty());
    }
}
