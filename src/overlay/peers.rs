//! Peer Registry
//!
//! Long-lived HTTP handles to the peers this node dials, built once at
//! startup from the topology's `connects_to` list. Handles are shared by
//! every concurrent request; the client multiplexes calls internally, so the
//! registry needs no locking after construction.

use super::protocol::{ENDPOINT_GATHER, GatherRequest, GatherResponse};
use crate::topology::model::Topology;
use crate::topology::types::NodeDescriptor;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::time::Duration;

/// Address of the host carrying the other host group. Loopback when unset.
pub const REMOTE_HOST_ENV: &str = "REMOTE_HOST";

const LOOPBACK: &str = "127.0.0.1";

/// An RPC endpoint for a single remote peer.
#[derive(Clone)]
pub struct PeerHandle {
    pub node: NodeDescriptor,
    base_url: String,
    client: reqwest::Client,
}

impl PeerHandle {
    fn new(node: NodeDescriptor, host: &str, client: reqwest::Client) -> Self {
        let base_url = format!("http://{}:{}", host, node.port);
        Self {
            node,
            base_url,
            client,
        }
    }

    pub fn id(&self) -> &str {
        &self.node.id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One outbound gather call with its own deadline. Timeouts, transport
    /// errors and non-2xx statuses all surface as `Err`; the caller decides
    /// whether that fails anything (it never fails the enclosing request).
    pub async fn gather(
        &self,
        request: &GatherRequest,
        deadline: Duration,
    ) -> Result<GatherResponse> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, ENDPOINT_GATHER))
            .json(request)
            .timeout(deadline)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "gather to {} failed with status {}",
                self.node.id,
                response.status()
            ));
        }

        Ok(response.json().await?)
    }
}

/// `peer_id -> handle` for every peer in the local node's `connects_to`
/// list. Immutable after startup.
pub struct PeerRegistry {
    peers: HashMap<String, PeerHandle>,
}

impl PeerRegistry {
    /// Resolves each peer's address and opens a handle for it. Peers in the
    /// local host group live on loopback; peers in a different group resolve
    /// to `remote_host` (loopback fallback when none is supplied).
    pub fn from_topology(topology: &Topology, self_id: &str, remote_host: Option<&str>) -> Self {
        let local_group = topology.node(self_id).map(|n| n.host_group);
        let client = reqwest::Client::new();

        let mut peers = HashMap::new();
        for peer in topology.peers_of(self_id) {
            let host = if Some(peer.host_group) == local_group {
                LOOPBACK
            } else {
                remote_host.unwrap_or(LOOPBACK)
            };
            let handle = PeerHandle::new(peer.clone(), host, client.clone());
            tracing::info!("Registered peer {} at {}", peer.id, handle.base_url());
            peers.insert(peer.id.clone(), handle);
        }

        Self { peers }
    }

    pub fn peer(&self, id: &str) -> Option<&PeerHandle> {
        self.peers.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerHandle> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
