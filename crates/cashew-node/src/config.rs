//! Node configuration.
//!
//! One sub-struct per concern, `#[serde(default)]` fields with
//! default-value functions, a `toml`-based parse entry point. Reading the
//! file from disk and wiring this into `std::env::args()` is the external
//! CLI/config-loader's job; this module only owns defaults and the
//! parse/validate logic.

use serde::{Deserialize, Serialize};

/// One configured bootstrap node
/// (`{address, public_key, description}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapNodeConfig {
    pub address: String,
    /// Hex-encoded Ed25519 public key.
    pub public_key: String,
    #[serde(default)]
    pub description: String,
}

/// `ConnectionPolicy` overrides. Any field left `None`
/// falls back to `cashew_peer::ConnectionPolicy::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionPolicyConfig {
    pub max_peers: Option<usize>,
    pub target_peers: Option<usize>,
    pub min_peers: Option<usize>,
    pub max_bootstrap: Option<usize>,
    pub connect_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub reconnect_delay_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub min_reliability: Option<f64>,
}

impl ConnectionPolicyConfig {
    pub fn resolve(&self) -> cashew_peer::ConnectionPolicy {
        let default = cashew_peer::ConnectionPolicy::default();
        cashew_peer::ConnectionPolicy {
            max_peers: self.max_peers.unwrap_or(default.max_peers),
            target_peers: self.target_peers.unwrap_or(default.target_peers),
            min_peers: self.min_peers.unwrap_or(default.min_peers),
            max_bootstrap: self.max_bootstrap.unwrap_or(default.max_bootstrap),
            connect_timeout_secs: self.connect_timeout_secs.unwrap_or(default.connect_timeout_secs),
            idle_timeout_secs: self.idle_timeout_secs.unwrap_or(default.idle_timeout_secs),
            reconnect_delay_secs: self.reconnect_delay_secs.unwrap_or(default.reconnect_delay_secs),
            max_attempts: self.max_attempts.unwrap_or(default.max_attempts),
            min_reliability: self.min_reliability.unwrap_or(default.min_reliability),
            ..default
        }
    }
}

/// Gossip-layer knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipConfig {
    #[serde(default = "default_fanout")]
    pub fanout: usize,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self { fanout: default_fanout() }
    }
}

fn default_fanout() -> usize {
    cashew_gossip::DEFAULT_FANOUT
}

/// PoW bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowConfig {
    #[serde(default = "default_min_difficulty")]
    pub min_difficulty: u32,
    #[serde(default = "default_max_difficulty")]
    pub max_difficulty: u32,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            min_difficulty: default_min_difficulty(),
            max_difficulty: default_max_difficulty(),
        }
    }
}

fn default_min_difficulty() -> u32 {
    cashew_pow::MIN_DIFFICULTY
}

fn default_max_difficulty() -> u32 {
    cashew_pow::MAX_DIFFICULTY
}

/// Default outbound bandwidth-limiter burst capacity: 16 MiB.
pub const DEFAULT_BANDWIDTH_CAPACITY_BYTES: u64 = 16 * 1024 * 1024;
/// Default outbound bandwidth-limiter sustained refill rate: 4 MiB/s.
pub const DEFAULT_BANDWIDTH_REFILL_BYTES_PER_SEC: u64 = 4 * 1024 * 1024;

/// Outbound token-bucket bandwidth-limiter knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandwidthConfig {
    #[serde(default = "default_bandwidth_capacity")]
    pub capacity_bytes: u64,
    #[serde(default = "default_bandwidth_refill")]
    pub refill_bytes_per_sec: u64,
}

impl Default for BandwidthConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: default_bandwidth_capacity(),
            refill_bytes_per_sec: default_bandwidth_refill(),
        }
    }
}

fn default_bandwidth_capacity() -> u64 {
    DEFAULT_BANDWIDTH_CAPACITY_BYTES
}

fn default_bandwidth_refill() -> u64 {
    DEFAULT_BANDWIDTH_REFILL_BYTES_PER_SEC
}

/// Top-level node configuration: `identity_file`, `identity_password`,
/// the bootstrap-node list, connection-policy overrides, gossip fanout,
/// PoW bounds, bandwidth-limiter burst/refill rate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Path to the identity blob. Reading/writing it is the external
    /// identity loader's job; this crate only
    /// carries the configured path through.
    #[serde(default)]
    pub identity_file: Option<String>,
    #[serde(default)]
    pub identity_password: Option<String>,
    #[serde(default)]
    pub bootstrap_nodes: Vec<BootstrapNodeConfig>,
    #[serde(default)]
    pub connection_policy: ConnectionPolicyConfig,
    #[serde(default)]
    pub gossip: GossipConfig,
    #[serde(default)]
    pub pow: PowConfig,
    #[serde(default)]
    pub bandwidth: BandwidthConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("bootstrap node {address:?} has a malformed public_key: {reason}")]
    BadBootstrapKey { address: String, reason: String },

    #[error("pow.min_difficulty ({min}) must not exceed pow.max_difficulty ({max})")]
    PowBoundsInverted { min: u32, max: u32 },

    #[error("failed to serialize config to TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl NodeConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Cross-field checks `serde`'s per-field defaults can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pow.min_difficulty > self.pow.max_difficulty {
            return Err(ConfigError::PowBoundsInverted {
                min: self.pow.min_difficulty,
                max: self.pow.max_difficulty,
            });
        }
        for node in &self.bootstrap_nodes {
            let bytes = hex::decode(&node.public_key).map_err(|e| ConfigError::BadBootstrapKey {
                address: node.address.clone(),
                reason: e.to_string(),
            })?;
            if bytes.len() != 32 {
                return Err(ConfigError::BadBootstrapKey {
                    address: node.address.clone(),
                    reason: format!("expected 32 bytes, got {}", bytes.len()),
                });
            }
        }
        Ok(())
    }
}
