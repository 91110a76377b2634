//! In-memory `ContentStore` backing the node's locally-hosted things.
//!
//! Durable storage is outside the core; only the router's `ContentStore`
//! contract matters here. This is the simplest implementation of that
//! contract, keyed the same way `cashew-router`'s own test double is.

use std::collections::HashMap;

use cashew_router::ContentStore;

/// Content this node hosts, keyed by `BLAKE3(content)`.
#[derive(Default)]
pub struct MapContentStore {
    things: HashMap<[u8; 32], Vec<u8>>,
}

impl MapContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host a new thing, returning its content hash.
    pub fn put(&mut self, data: Vec<u8>) -> [u8; 32] {
        let hash = cashew_crypto::blake3::hash(&data);
        self.things.insert(hash, data);
        hash
    }

    pub fn remove(&mut self, content_hash: &[u8; 32]) -> Option<Vec<u8>> {
        self.things.remove(content_hash)
    }

    pub fn len(&self) -> usize {
        self.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }
}

impl ContentStore for MapContentStore {
    fn get(&self, content_hash: &[u8; 32]) -> Option<Vec<u8>> {
        self.things.get(content_hash).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get_roundtrips() {
        let mut store = MapContentStore::new();
        let hash = store.put(b"hello cashew".to_vec());
        assert_eq!(store.get(&hash), Some(b"hello cashew".to_vec()));
    }

    #[test]
    fn test_remove_clears_entry() {
        let mut store = MapContentStore::new();
        let hash = store.put(b"ephemeral".to_vec());
        store.remove(&hash);
        assert_eq!(store.get(&hash), None);
    }
}
