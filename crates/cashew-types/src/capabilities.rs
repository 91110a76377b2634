//! Node capability advertisement, shared by gossip peer announcements and
//! peer-manager candidate selection.

use serde::{Deserialize, Serialize};

use crate::wire::{Reader, Writer};
use crate::Result;

const FLAG_HOST: u8 = 1 << 0;
const FLAG_ROUTE: u8 = 1 << 1;
const FLAG_STORAGE: u8 = 1 << 2;

/// A node's advertised capabilities. Wire size is 17 bytes: `flags(1) ∥
/// storage_capacity(8) ∥ bandwidth_mbps(8)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeCapabilities {
    pub can_host: bool,
    pub can_route: bool,
    pub can_store: bool,
    pub storage_capacity: u64,
    pub bandwidth_mbps: u64,
}

/// Wire-encoded size of a `NodeCapabilities` value.
pub const NODE_CAPABILITIES_WIRE_LEN: usize = 1 + 8 + 8;

impl NodeCapabilities {
    pub fn to_bytes(&self) -> [u8; NODE_CAPABILITIES_WIRE_LEN] {
        let mut flags = 0u8;
        if self.can_host {
            flags |= FLAG_HOST;
        }
        if self.can_route {
            flags |= FLAG_ROUTE;
        }
        if self.can_store {
            flags |= FLAG_STORAGE;
        }

        let mut w = Writer::with_capacity(NODE_CAPABILITIES_WIRE_LEN);
        w.u8(flags).u64(self.storage_capacity).u64(self.bandwidth_mbps);
        let v = w.into_vec();
        let mut out = [0u8; NODE_CAPABILITIES_WIRE_LEN];
        out.copy_from_slice(&v);
        out
    }

    pub fn write_to(&self, w: &mut Writer) {
        let bytes = self.to_bytes();
        w.bytes(&bytes);
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let v = Self::read_from(&mut r)?;
        r.finish()?;
        Ok(v)
    }

    pub fn read_from(r: &mut Reader<'_>) -> Result<Self> {
        let flags = r.u8()?;
        let storage_capacity = r.u64()?;
        let bandwidth_mbps = r.u64()?;
        Ok(Self {
            can_host: flags & FLAG_HOST != 0,
            can_route: flags & FLAG_ROUTE != 0,
            can_store: flags & FLAG_STORAGE != 0,
            storage_capacity,
            bandwidth_mbps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let caps = NodeCapabilities {
            can_host: true,
            can_route: false,
            can_store: true,
            storage_capacity: 1_000_000,
            bandwidth_mbps: 100,
        };
        let bytes = caps.to_bytes();
        assert_eq!(bytes.len(), NODE_CAPABILITIES_WIRE_LEN);

        let restored = NodeCapabilities::from_bytes(&bytes).expect("decode");
        assert_eq!(restored, caps);
    }

    #[test]
    fn test_flags_independent() {
        let caps = NodeCapabilities {
            can_host: false,
            can_route: true,
            can_store: false,
            storage_capacity: 0,
            bandwidth_mbps: 0,
        };
        let restored = NodeCapabilities::from_bytes(&caps.to_bytes()).expect("decode");
        assert!(!restored.can_host);
        assert!(restored.can_route);
        assert!(!restored.can_store);
    }
}
