//! Revocation acceptance, storage, and dissemination bookkeeping.
//!
//! The broadcaster is the single owner of accepted revocations. Gossip and the router never hold a `KeyRevocation` directly
//! — they hand raw bytes to [`RevocationBroadcaster::accept`] and query
//! [`RevocationBroadcaster::is_key_revoked`] by public key.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::record::KeyRevocation;
use crate::{
    RevocationError, Result, CLOCK_SKEW_TOLERANCE_SECS, DEFAULT_EXPIRY_DAYS,
    RECENT_LIST_MAX_ENTRIES, RECENT_WINDOW_SECS,
};

const SECS_PER_DAY: u64 = 86_400;

/// Accepts, stores, and expires [`KeyRevocation`] records.
///
/// `is_key_revoked` is a single `HashMap` lookup, O(1) amortized. The
/// seen-set (`by_hash`) exists purely to reject replays of an
/// already-accepted record; the authoritative store is `by_revoked_pk`.
pub struct RevocationBroadcaster {
    expiry_days: u64,
    by_revoked_pk: HashMap<[u8; 32], KeyRevocation>,
    replacements: HashMap<[u8; 32], [u8; 32]>,
    by_hash: HashMap<[u8; 32], u64>,
}

impl RevocationBroadcaster {
    pub fn new() -> Self {
        Self::with_expiry_days(DEFAULT_EXPIRY_DAYS)
    }

    pub fn with_expiry_days(expiry_days: u64) -> Self {
        Self {
            expiry_days,
            by_revoked_pk: HashMap::new(),
            replacements: HashMap::new(),
            by_hash: HashMap::new(),
        }
    }

    /// Validate and store a revocation received at `now`. Accepted iff
    /// (a) its hash is unseen, (b) `revoked_at` is not unreasonably in the
    /// future, (c) it has not expired, (d) any attached rotation
    /// certificate is internally consistent, (e) the signature verifies
    /// under the appropriate signer.
    pub fn accept(&mut self, revocation: KeyRevocation, now: u64) -> Result<()> {
        let hash = revocation.hash();
        if self.by_hash.contains_key(&hash) {
            return Err(RevocationError::Duplicate);
        }

        if revocation.revoked_at > now + CLOCK_SKEW_TOLERANCE_SECS {
            return Err(RevocationError::TooFarInFuture);
        }

        let age = now.saturating_sub(revocation.revoked_at);
        if age >= self.expiry_days.saturating_mul(SECS_PER_DAY) {
            return Err(RevocationError::Expired);
        }

        revocation.verify_rotation_cert()?;
        revocation.verify_signature()?;

        debug!(revoked_pk = %hex::encode(revocation.revoked_pk), "revocation accepted");

        self.by_hash.insert(hash, revocation.revoked_at);
        if let Some(replacement_pk) = revocation.replacement_pk {
            self.replacements.insert(revocation.revoked_pk, replacement_pk);
        }
        self.by_revoked_pk.insert(revocation.revoked_pk, revocation);
        Ok(())
    }

    /// O(1) lookup: has `pk` been revoked?
    pub fn is_key_revoked(&self, pk: &[u8; 32]) -> bool {
        self.by_revoked_pk.contains_key(pk)
    }

    /// The replacement key for a revoked key, if one was named.
    pub fn get_replacement_key(&self, pk: &[u8; 32]) -> Option<[u8; 32]> {
        self.replacements.get(pk).copied()
    }

    pub fn get(&self, pk: &[u8; 32]) -> Option<&KeyRevocation> {
        self.by_revoked_pk.get(pk)
    }

    pub fn len(&self) -> usize {
        self.by_revoked_pk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_revoked_pk.is_empty()
    }

    /// Revocations to hand to gossip for dissemination: either every
    /// stored revocation, or only those revoked within
    /// [`crate::RECENT_WINDOW_SECS`], bounded to
    /// [`crate::RECENT_LIST_MAX_ENTRIES`] entries either way.
    pub fn create_revocation_list(&self, recent: bool, now: u64) -> Vec<KeyRevocation> {
        let mut list: Vec<&KeyRevocation> = self
            .by_revoked_pk
            .values()
            .filter(|r| !recent || now.saturating_sub(r.revoked_at) <= RECENT_WINDOW_SECS)
            .collect();
        list.sort_by_key(|r| std::cmp::Reverse(r.revoked_at));
        list.truncate(RECENT_LIST_MAX_ENTRIES);
        list.into_iter().cloned().collect()
    }

    /// Remove every revocation whose validity window has elapsed. Run
    /// periodically by the node's maintenance cycle.
    pub fn sweep_expired(&mut self, now: u64) {
        let expiry_secs = self.expiry_days.saturating_mul(SECS_PER_DAY);
        let expired: Vec<[u8; 32]> = self
            .by_revoked_pk
            .values()
            .filter(|r| now.saturating_sub(r.revoked_at) >= expiry_secs)
            .map(|r| r.revoked_pk)
            .collect();

        if !expired.is_empty() {
            warn!(count = expired.len(), "sweeping expired revocations");
        }

        for pk in expired {
            if let Some(revocation) = self.by_revoked_pk.remove(&pk) {
                self.by_hash.remove(&revocation.hash());
            }
            self.replacements.remove(&pk);
        }
    }
}

impl Default for RevocationBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
