//! # cashew-peer
//!
//! Discovery set bookkeeping, connection-candidate scoring, and the
//! periodic maintenance cycle that keeps a node's active connection count
//! near its target.
//!
//! This crate does not open sockets or own `Session`s; it directs a
//! `&mut cashew_session::SessionManager` passed in at call time, and
//! otherwise only ever refers to peers by `NodeId`.

pub mod discovery;
pub mod manager;
pub mod policy;

pub use discovery::{BootstrapNode, DiscoveredPeer};
pub use manager::{MaintenanceReport, OutboundAttempt, PeerManager};
pub use policy::ConnectionPolicy;

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("maximum configured bootstrap nodes reached")]
    BootstrapLimitReached,
}

pub type Result<T> = std::result::Result<T, PeerError>;
