use axum::{
    Json, Router,
    extract::Extension,
    routing::{get, post},
};
use basecamp_overlay::cache::query_cache::QueryCache;
use basecamp_overlay::messaging::handlers::{
    handle_chat, handle_send_batch, handle_send_message, handle_subscribe,
};
use basecamp_overlay::messaging::protocol::{
    ENDPOINT_CHAT, ENDPOINT_MESSAGE, ENDPOINT_MESSAGE_BATCH, ENDPOINT_SUBSCRIBE,
};
use basecamp_overlay::messaging::service::MessageService;
use basecamp_overlay::overlay::engine::{EngineConfig, QueryEngine};
use basecamp_overlay::overlay::handlers::{handle_gather, handle_query};
use basecamp_overlay::overlay::peers::{PeerRegistry, REMOTE_HOST_ENV};
use basecamp_overlay::overlay::protocol::{ENDPOINT_GATHER, ENDPOINT_QUERY};
use basecamp_overlay::store::partition::PartitionStore;
use basecamp_overlay::topology::model::Topology;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut address: Option<SocketAddr> = None;
    let mut node_id: Option<String> = None;
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--address" if i + 1 < args.len() => {
                address = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--node-id" if i + 1 < args.len() => {
                node_id = Some(args[i + 1].clone());
                i += 2;
            }
            "--config" if i + 1 < args.len() => {
                config_path = Some(args[i + 1].clone());
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let (Some(node_id), Some(config_path)) = (node_id, config_path) else {
        eprintln!(
            "Usage: {} --node-id ID --config path [--address host:port]",
            args[0]
        );
        eprintln!(
            "Example: {} --node-id A --config topology.json --address 0.0.0.0:50051",
            args[0]
        );
        std::process::exit(1);
    };

    // Configuration errors are fatal before the listener binds.
    let topology = Topology::load(&config_path)?;
    let node = topology
        .node(&node_id)
        .ok_or_else(|| anyhow::anyhow!("node {} is not in the topology", node_id))?
        .clone();
    let is_portal = topology.is_portal(&node.id);

    tracing::info!(
        "Starting node {} (portal: {}) owning keys [{}, {}]",
        node.id,
        is_portal,
        node.range.lo,
        node.range.hi
    );

    let store = Arc::new(PartitionStore::new(&node.id, node.range));
    store.seed();

    let cache = Arc::new(QueryCache::new(
        topology.cache_capacity(),
        topology.cache_ttl(),
    ));

    let remote_host = std::env::var(REMOTE_HOST_ENV).ok();
    let registry = Arc::new(PeerRegistry::from_topology(
        &topology,
        &node.id,
        remote_host.as_deref(),
    ));
    tracing::info!("Peer registry holds {} peer(s)", registry.len());

    let engine = QueryEngine::new(
        node.clone(),
        is_portal,
        store,
        cache,
        registry,
        EngineConfig::default(),
    );
    let messages = Arc::new(MessageService::new());

    let app = Router::new()
        .route(ENDPOINT_QUERY, post(handle_query))
        .route(ENDPOINT_GATHER, post(handle_gather))
        .route(ENDPOINT_MESSAGE, post(handle_send_message))
        .route(ENDPOINT_MESSAGE_BATCH, post(handle_send_batch))
        .route(ENDPOINT_SUBSCRIBE, get(handle_subscribe))
        .route(ENDPOINT_CHAT, get(handle_chat))
        .route("/health", get(handle_health))
        .layer(Extension(engine))
        .layer(Extension(messages));

    let listen_addr =
        address.unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], node.port)));

    tracing::info!("Node {} listening on {}", node.id, listen_addr);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Node {} stopped", node.id);
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}

#[derive(Serialize)]
struct NodeHealth {
    node_id: String,
    portal: bool,
    range: [u32; 2],
    peers: Vec<String>,
    local_items: usize,
    stored_messages: usize,
}

async fn handle_health(
    Extension(engine): Extension<Arc<QueryEngine>>,
    Extension(messages): Extension<Arc<MessageService>>,
) -> Json<NodeHealth> {
    let node = engine.node();
    let range = node.range;
    Json(NodeHealth {
        node_id: node.id.clone(),
        portal: engine.is_portal(),
        range: [range.lo, range.hi],
        peers: engine.peer_ids(),
        local_items: engine.store().len(),
        stored_messages: messages.message_count(),
    })
}
