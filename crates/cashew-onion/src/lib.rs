//! # cashew-onion
//!
//! Layered onion circuit construction and peeling.
//!
//! Each relay chosen for a path only ever learns the identity of the next
//! hop and an opaque inner layer — never the full path or the final
//! destination unless it is the destination. Layers are built
//! destination-inward (the innermost layer is addressed to the destination,
//! the outermost to the first hop) and peeled hop-by-hop in the opposite
//! order.

pub mod layer;
pub mod path;

pub use layer::{OnionLayer, PeelResult};
pub use path::{select_path, PathHop};

use cashew_types::wire::WireError;

/// Default path length (source, N-2 relays, destination) when the caller
/// does not request a specific length.
pub const DEFAULT_PATH_LENGTH: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum OnionError {
    #[error("crypto error: {0}")]
    Crypto(#[from] cashew_crypto::CryptoError),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("not enough candidate hops to build a path of length {requested}: have {available}")]
    InsufficientPath { requested: usize, available: usize },

    #[error("path must contain at least one hop")]
    EmptyPath,

    #[error("unknown inner layer tag: {0}")]
    UnknownTag(u8),
}

pub type Result<T> = std::result::Result<T, OnionError>;
