//! cashew-node: the reference Cashew network node binary.
//!
//! Single OS process, one Tokio runtime, wiring every protocol crate
//! behind [`cashew_node::NodeState`] and driving it with a periodic
//! maintenance loop. No control-surface RPC is exposed here; operators
//! drive the node purely through its config file and logs.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use cashew_crypto::x25519::StaticSecret;
use cashew_node::{InProcessTransport, NodeConfig, NodeState};
use cashew_types::Identity;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("cashew=info".parse()?),
        )
        .init();

    info!("cashew node starting");

    // Loading an on-disk identity blob is the external config-loader's
    // job. This entry point generates a fresh identity every run; a real
    // deployment plugs in the persisted loader here without touching
    // NodeState.
    let identity = Identity::generate()?;
    let onion_secret = StaticSecret::generate();
    let signing_key_for_sessions = identity.signing_key.clone();

    let config_path = std::env::args().nth(1);
    let config = match config_path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            NodeConfig::from_toml_str(&raw)?
        }
        None => NodeConfig::default(),
    };

    let now = now_secs();
    let transport = Arc::new(InProcessTransport::new());
    let state = Arc::new(NodeState::new(
        &identity,
        signing_key_for_sessions,
        onion_secret,
        config,
        transport,
        now,
    ));

    info!(node = %state.node_id, "identity generated");
    state.seed_bootstrap_nodes(now).await;

    let mut maintenance_tick = interval(Duration::from_secs(10));
    loop {
        tokio::select! {
            _ = maintenance_tick.tick() => {
                let now = now_secs();
                let report = state.run_peer_maintenance(now).await;
                if report.initiated > 0 || report.disconnected_idle > 0 || report.purged_stale_discovered > 0 {
                    info!(
                        initiated = report.initiated,
                        disconnected = report.disconnected_idle,
                        purged = report.purged_stale_discovered,
                        "peer maintenance"
                    );
                }
                state.run_router_maintenance(now).await;
                state.run_revocation_maintenance(now).await;
                state.run_epoch_maintenance(now).await;
                info!(status = %state.status(now).await.summary(), "status");
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("ctrl-c received, shutting down");
                break;
            }
        }
    }

    info!("cashew node stopped");
    Ok(())
}
