//! Node-wide session table.
//!
//! The `SessionManager` is the exclusive owner of every [`Session`]; other
//! subsystems (the Peer Manager, the Router) refer to sessions by
//! [`NodeId`] and never hold a session reference of their own.
//!
//! `SessionManager` does not resolve a remote `NodeId` to its long-term
//! `VerifyingKey` itself — that mapping comes from wherever the caller
//! learned about the peer (a gossip `PeerAnnouncement`, a bootstrap list).
//! Callers pass the resolved key in at the handshake boundary.

use std::collections::HashMap;

use cashew_crypto::ed25519::{SigningKey, VerifyingKey};
use cashew_types::NodeId;
use tracing::{debug, info, warn};

use crate::handshake::HandshakeMessage;
use crate::session::{Session, SessionState};
use crate::{Result, SessionError};

/// Owns every [`Session`] for this node, indexed by remote [`NodeId`].
pub struct SessionManager {
    local_node_id: NodeId,
    signing_key: SigningKey,
    sessions: HashMap<NodeId, Session>,
}

impl SessionManager {
    pub fn new(local_node_id: NodeId, signing_key: SigningKey) -> Self {
        Self {
            local_node_id,
            signing_key,
            sessions: HashMap::new(),
        }
    }

    pub fn local_node_id(&self) -> NodeId {
        self.local_node_id
    }

    /// Begin an outbound handshake to `remote_node_id`. Returns the signed
    /// [`HandshakeMessage`] the caller must send. Fails if a session to
    /// this peer already exists.
    pub fn create_outbound(&mut self, remote_node_id: NodeId, now: u64) -> Result<HandshakeMessage> {
        if self.sessions.contains_key(&remote_node_id) {
            return Err(SessionError::DuplicateSession);
        }

        let session = Session::new_outbound(self.local_node_id, remote_node_id, now);
        let msg = HandshakeMessage::build(
            &self.signing_key,
            self.local_node_id,
            session.ephemeral_public,
            now,
        );
        self.sessions.insert(remote_node_id, session);
        debug!(remote = %remote_node_id, "outbound handshake initiated");
        Ok(msg)
    }

    /// Complete an outbound handshake once the responder's message arrives.
    /// Validates `response` against `remote_verifying_key` (version,
    /// clock-skew, Ed25519 signature) before deriving session keys — an
    /// unauthenticated handshake must never reach `Established`.
    pub fn complete_outbound(
        &mut self,
        response: &HandshakeMessage,
        remote_verifying_key: &VerifyingKey,
        now: u64,
    ) -> Result<()> {
        response.validate(remote_verifying_key, now)?;

        let session = self
            .sessions
            .get_mut(&response.node_id)
            .ok_or(SessionError::NoSuchSession)?;
        session.complete_handshake(response.ephemeral_pk, now)?;
        info!(remote = %response.node_id, "session established (initiator)");
        Ok(())
    }

    /// Accept an inbound handshake `init` from a peer we do not yet have a
    /// session with, and return the signed response to send back. The
    /// session is `Established` immediately on our side: the responder has
    /// everything it needs (our ephemeral key, the peer's ephemeral key)
    /// to derive session keys in one round trip.
    pub fn accept_inbound_handshake(
        &mut self,
        init: &HandshakeMessage,
        remote_verifying_key: &VerifyingKey,
        now: u64,
    ) -> Result<HandshakeMessage> {
        init.validate(remote_verifying_key, now)?;

        if self.sessions.contains_key(&init.node_id) {
            return Err(SessionError::DuplicateSession);
        }

        let mut session = Session::new_inbound(self.local_node_id, init.node_id, now);
        let response = HandshakeMessage::build(
            &self.signing_key,
            self.local_node_id,
            session.ephemeral_public,
            now,
        );
        session.complete_handshake(init.ephemeral_pk, now)?;

        self.sessions.insert(init.node_id, session);
        info!(remote = %init.node_id, "session established (responder)");
        Ok(response)
    }

    pub fn get(&self, remote: &NodeId) -> Option<&Session> {
        self.sessions.get(remote)
    }

    pub fn get_mut(&mut self, remote: &NodeId) -> Option<&mut Session> {
        self.sessions.get_mut(remote)
    }

    /// Encrypt `plaintext` for `remote` under its established session.
    pub fn encrypt_to(&mut self, remote: &NodeId, plaintext: &[u8]) -> Result<Vec<u8>> {
        let session = self.sessions.get_mut(remote).ok_or(SessionError::NoSuchSession)?;
        session.encrypt_message(plaintext)
    }

    /// Decrypt `frame` from `remote`. On failure, the session is closed:
    /// decryption failures are surfaced as an error and must close the
    /// session rather than leave it in an ambiguous state.
    pub fn decrypt_from(&mut self, remote: &NodeId, frame: &[u8]) -> Result<Vec<u8>> {
        let session = self.sessions.get_mut(remote).ok_or(SessionError::NoSuchSession)?;
        match session.decrypt_message(frame) {
            Ok(pt) => Ok(pt),
            Err(e) => {
                session.close();
                warn!(remote = %remote, "decrypt failed, session closed");
                Err(e)
            }
        }
    }

    /// Close and remove the session to `remote`, if any.
    pub fn close(&mut self, remote: &NodeId) {
        if let Some(mut session) = self.sessions.remove(remote) {
            session.close();
        }
    }

    /// Close and remove every session.
    pub fn close_all(&mut self) {
        for (_, mut session) in self.sessions.drain() {
            session.close();
        }
    }

    /// Close every session that has had no activity for the idle timeout,
    /// returning the peers that were disconnected.
    pub fn cleanup_timed_out(&mut self, now: u64) -> Vec<NodeId> {
        let timed_out: Vec<NodeId> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.has_timed_out(now))
            .map(|(id, _)| *id)
            .collect();

        for id in &timed_out {
            self.close(id);
        }
        timed_out
    }

    /// Remote peers whose session should be torn down and rebuilt.
    pub fn rekey_due(&self, now: u64) -> Vec<NodeId> {
        self.sessions
            .iter()
            .filter(|(_, s)| s.should_rekey(now))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Remote peers with a session in the `Established` state.
    pub fn connected_peers(&self) -> Vec<NodeId> {
        self.sessions
            .iter()
            .filter(|(_, s)| s.state() == SessionState::Established)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Total number of sessions tracked, in any state.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
