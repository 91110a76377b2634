//! Node-wide wiring: one instance of every manager, each behind its own
//! fine-grained lock (SessionManager, RoutingTable, ContributionTracker,
//! Broadcaster, ...) rather than one global lock over node state.

use std::sync::Arc;

use cashew_contribution::ContributionEngine;
use cashew_crypto::ed25519::SigningKey;
use cashew_crypto::x25519::StaticSecret;
use cashew_gossip::{GossipProtocol, GossipScheduler};
use cashew_peer::PeerManager;
use cashew_revocation::RevocationBroadcaster;
use cashew_router::Router;
use cashew_session::manager::SessionManager;
use cashew_session::BandwidthLimiter;
use cashew_types::{Identity, NodeId};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::NodeConfig;
use crate::epoch::EpochScheduler;
use crate::status::NodeStatus;
use crate::store::MapContentStore;
use crate::transport::{ByteTransport, SessionTransport};

/// Everything one running node needs, wired together. Generic over the
/// underlying [`ByteTransport`] so tests can plug in
/// [`crate::transport::InProcessTransport`] and a real deployment can plug
/// in a socket-backed one without touching any protocol crate.
pub struct NodeState<T: ByteTransport + 'static> {
    pub node_id: NodeId,
    pub config: NodeConfig,
    pub sessions: Arc<Mutex<SessionManager>>,
    pub peers: Arc<Mutex<PeerManager>>,
    pub router: Arc<Mutex<Router<MapContentStore>>>,
    pub gossip: Arc<Mutex<GossipProtocol>>,
    pub gossip_scheduler: Arc<Mutex<GossipScheduler>>,
    pub contribution: Arc<Mutex<ContributionEngine>>,
    pub revocations: Arc<Mutex<RevocationBroadcaster>>,
    pub transport: Arc<SessionTransport<T>>,
    epoch_scheduler: Arc<Mutex<EpochScheduler>>,
    last_rewards: Arc<Mutex<Vec<cashew_contribution::KeyReward>>>,
    bytes: Arc<T>,
    started_at: u64,
}

impl<T: ByteTransport + 'static> NodeState<T> {
    /// Wire up a fresh node. `identity` is assumed already loaded (the
    /// identity file's read/decrypt is the external loader's job);
    /// `onion_secret` is the node's X25519 secret used to peel onion
    /// layers addressed to it.
    pub fn new(
        identity: &Identity,
        signing_key_for_sessions: SigningKey,
        onion_secret: StaticSecret,
        config: NodeConfig,
        bytes: Arc<T>,
        now: u64,
    ) -> Self {
        let node_id = identity.node_id();
        let sessions = Arc::new(Mutex::new(SessionManager::new(node_id, signing_key_for_sessions)));
        let peers = Arc::new(Mutex::new(PeerManager::new(node_id, config.connection_policy.resolve())));
        let store = MapContentStore::new();
        let router = Arc::new(Mutex::new(Router::new(
            node_id,
            identity.signing_key.clone(),
            onion_secret,
            store,
        )));
        let gossip = Arc::new(Mutex::new(GossipProtocol::with_fanout(node_id, config.gossip.fanout)));
        let gossip_scheduler = Arc::new(Mutex::new(GossipScheduler::new(now)));
        let contribution = Arc::new(Mutex::new(ContributionEngine::new()));
        let revocations = Arc::new(Mutex::new(RevocationBroadcaster::new()));
        let bandwidth_limiter = Arc::new(BandwidthLimiter::new(
            config.bandwidth.capacity_bytes,
            config.bandwidth.refill_bytes_per_sec,
            now,
        ));
        let transport = Arc::new(SessionTransport::with_bandwidth_limiter(
            sessions.clone(),
            bytes.clone(),
            bandwidth_limiter,
        ));

        info!(node = %node_id, "node state initialized");

        Self {
            node_id,
            config,
            sessions,
            peers,
            router,
            gossip,
            gossip_scheduler,
            contribution,
            revocations,
            transport,
            epoch_scheduler: Arc::new(Mutex::new(EpochScheduler::new())),
            last_rewards: Arc::new(Mutex::new(Vec::new())),
            bytes,
            started_at: now,
        }
    }

    /// Register every configured bootstrap node with the Peer Manager.
    /// Malformed entries were already rejected by [`NodeConfig::validate`].
    pub async fn seed_bootstrap_nodes(&self, now: u64) {
        let mut peers = self.peers.lock().await;
        for entry in &self.config.bootstrap_nodes {
            let Ok(key_bytes) = hex::decode(&entry.public_key) else { continue };
            let Ok(key_array) = <[u8; 32]>::try_from(key_bytes.as_slice()) else { continue };
            let Ok(verifying_key) = cashew_crypto::ed25519::VerifyingKey::from_bytes(&key_array) else { continue };
            let node_id = NodeId::from_public_key(&verifying_key);
            let _ = peers.add_bootstrap(
                cashew_peer::BootstrapNode {
                    node_id,
                    address: entry.address.clone(),
                    description: entry.description.clone(),
                },
                now,
            );
        }
    }

    /// Run one round of peer-connection maintenance: purge stale
    /// discovered peers, disconnect idle sessions, and dial outbound
    /// handshakes toward new candidates, sending the raw (unencrypted;
    /// handshakes authenticate themselves via signature, not AEAD) frame
    /// for each over the byte transport directly.
    pub async fn run_peer_maintenance(&self, now: u64) -> cashew_peer::MaintenanceReport {
        let mut peers = self.peers.lock().await;
        let mut sessions = self.sessions.lock().await;
        let (report, attempts) = peers.run_maintenance_cycle(&mut sessions, now);
        drop(sessions);
        drop(peers);

        for attempt in attempts {
            if let Err(e) = self.bytes.send(attempt.peer, attempt.handshake.to_bytes().to_vec()).await {
                tracing::warn!(peer = %attempt.peer, error = %e, "failed to send outbound handshake");
            }
        }
        report
    }

    /// Purge timed-out pending requests and stale routing entries.
    pub async fn run_router_maintenance(&self, now: u64) {
        self.router.lock().await.cleanup(now);
    }

    /// Sweep expired key revocations.
    pub async fn run_revocation_maintenance(&self, now: u64) {
        self.revocations.lock().await.sweep_expired(now);
    }

    /// Process the contribution epoch boundary at `epoch`, returning the
    /// key rewards newly-active contributors earned. The caller (the
    /// node's event loop) is responsible for invoking this at most once
    /// per `epoch` index; a repeat call is rejected by
    /// [`ContributionEngine::process_epoch`] rather than silently
    /// re-emitting rewards.
    pub async fn process_epoch(&self, epoch: u64, now: u64) -> cashew_contribution::Result<Vec<cashew_contribution::KeyReward>> {
        self.contribution.lock().await.process_epoch(epoch, now)
    }

    /// Poll the epoch scheduler; if a new epoch boundary has been crossed
    /// since the last call, process it and cache the rewards for
    /// [`NodeState::status`]. A no-op within the same epoch.
    pub async fn run_epoch_maintenance(&self, now: u64) {
        let due = self.epoch_scheduler.lock().await.poll(now);
        let Some(epoch) = due else { return };

        match self.process_epoch(epoch, now).await {
            Ok(rewards) => {
                info!(epoch, reward_count = rewards.len(), "epoch processed");
                *self.last_rewards.lock().await = rewards;
            }
            Err(e) => {
                tracing::error!(epoch, error = %e, "epoch processing failed");
            }
        }
    }

    /// Assemble a [`NodeStatus`] snapshot from the current state of every
    /// manager.
    pub async fn status(&self, now: u64) -> NodeStatus {
        let peers = self.peers.lock().await;
        let sessions = self.sessions.lock().await;
        let router = self.router.lock().await;
        let revocations = self.revocations.lock().await;
        let epoch_scheduler = self.epoch_scheduler.lock().await;
        let last_rewards = self.last_rewards.lock().await;

        NodeStatus {
            node_id: self.node_id,
            uptime_secs: now.saturating_sub(self.started_at),
            connected_peer_count: sessions.connected_peers().len(),
            discovered_peer_count: peers.discovered_count(),
            routing_table_size: router.routing_table().len(),
            pending_request_count: router.pending().len(),
            revocation_count: revocations.len(),
            current_epoch: epoch_scheduler.last_processed(),
            last_rewards: last_rewards.clone(),
        }
    }
}
