//! The `Router`: dispatches incoming requests/responses.
//!
//! A per-request return table resolves response routing: every hop that forwards a `ContentRequest` — including the
//! originator — records a [`crate::pending::PendingRequest`] keyed by
//! `request_id`. The matching `ContentResponse` is then sent straight back
//! along that recorded reverse hop with no source routing or gossip
//! fan-out, until it reaches the hop whose entry has `reverse_hop = None`:
//! the originator.

use cashew_crypto::ed25519::{SigningKey, VerifyingKey};
use cashew_crypto::x25519::StaticSecret;
use cashew_onion::{OnionLayer, PeelResult};
use cashew_types::NodeId;
use tracing::{debug, trace, warn};

use crate::entry::RoutingTable;
use crate::host_selection::select_best_host;
use crate::message::{ContentRequest, ContentResponse};
use crate::pending::PendingRequestTable;
use crate::transport::RouterTransport;

/// Local lookup for content this node itself hosts.
pub trait ContentStore {
    /// The raw bytes for `content_hash`, if this node hosts it.
    fn get(&self, content_hash: &[u8; 32]) -> Option<Vec<u8>>;
}

/// A registered callback invoked when a request this node originated times
/// out or finds no route.
pub type NotFoundHandler = Box<dyn Fn([u8; 32]) + Send + Sync>;
/// A registered callback invoked when a request this node originated is
/// satisfied.
pub type ContentReceivedHandler = Box<dyn Fn([u8; 32], Vec<u8>) + Send + Sync>;

/// Why an incoming request was dropped rather than served or forwarded.
#[derive(Debug, PartialEq, Eq)]
pub enum DropReason {
    HopLimitExhausted,
    NoRoute,
    OnionPeelFailed,
    MalformedInnerRequest,
}

/// Outcome of handling one incoming `ContentRequest`.
#[derive(Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// We host the content; a signed response was sent back to `from`.
    ServedLocally,
    /// Forwarded (with `hop_limit` decremented) to the selected host.
    Forwarded { to: NodeId },
    /// An onion layer was peeled and the residual relayed on, unparsed, to
    /// `to` — this hop never saw the inner request.
    RelayedOnion { to: NodeId },
    Dropped(DropReason),
}

/// Outcome of handling one incoming `ContentResponse`.
#[derive(Debug, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// We originated the matching request; delivered to the caller.
    Delivered,
    /// Forwarded to the next hop back toward the originator.
    Forwarded { to: NodeId },
    /// Content hash or signature failed validation. The host's
    /// reliability is penalized but the `PendingRequest` is left open for
    /// a possible future correct response.
    Mismatched,
    /// No `PendingRequest` matched this `request_id` (stale, already timed
    /// out, or a forged/duplicate response).
    Unmatched,
}

/// Content-addressed request/response dispatch, tying the routing table,
/// host selection, pending-request table, and onion peeling together.
pub struct Router<S: ContentStore> {
    local_node_id: NodeId,
    signing_key: SigningKey,
    onion_secret: StaticSecret,
    routing_table: RoutingTable,
    pending: PendingRequestTable,
    store: S,
    not_found_handlers: Vec<NotFoundHandler>,
    content_received_handlers: Vec<ContentReceivedHandler>,
}

impl<S: ContentStore> Router<S> {
    pub fn new(local_node_id: NodeId, signing_key: SigningKey, onion_secret: StaticSecret, store: S) -> Self {
        Self {
            local_node_id,
            signing_key,
            onion_secret,
            routing_table: RoutingTable::new(),
            pending: PendingRequestTable::new(),
            store,
            not_found_handlers: Vec::new(),
            content_received_handlers: Vec::new(),
        }
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    pub fn routing_table_mut(&mut self) -> &mut RoutingTable {
        &mut self.routing_table
    }

    pub fn pending(&self) -> &PendingRequestTable {
        &self.pending
    }

    pub fn register_not_found_handler(&mut self, handler: NotFoundHandler) {
        self.not_found_handlers.push(handler);
    }

    pub fn register_content_received_handler(&mut self, handler: ContentReceivedHandler) {
        self.content_received_handlers.push(handler);
    }

    fn invoke_not_found(&self, content_hash: [u8; 32]) {
        for handler in &self.not_found_handlers {
            handler(content_hash);
        }
    }

    fn invoke_content_received(&self, content_hash: [u8; 32], data: Vec<u8>) {
        for handler in &self.content_received_handlers {
            handler(content_hash, data.clone());
        }
    }

    /// Originate a request for `content_hash`. Selects the best known
    /// host, records a `PendingRequest` with `reverse_hop = None`, and
    /// sends it. Invokes the not-found callback synchronously and returns
    /// `Dropped(NoRoute)` if no eligible host is known.
    pub async fn request_content<T: RouterTransport>(
        &mut self,
        content_hash: [u8; 32],
        hop_limit: u8,
        transport: &T,
        now: u64,
    ) -> RequestOutcome {
        let hop_limit = hop_limit.min(crate::MAX_HOP_LIMIT);
        let Some(host) = select_best_host(&self.routing_table, &content_hash, now) else {
            self.invoke_not_found(content_hash);
            return RequestOutcome::Dropped(DropReason::NoRoute);
        };

        let request = ContentRequest::new(content_hash, self.local_node_id, hop_limit, now);
        self.pending.insert(request.request_id, content_hash, None, now);

        if let Err(e) = transport.send_to(host, &request.to_bytes()).await {
            warn!(peer = %host, error = %e, "failed to send content request");
        }
        RequestOutcome::Forwarded { to: host }
    }

    /// Handle a `ContentRequest` received from `from`.
    pub async fn handle_incoming_request<T: RouterTransport>(
        &mut self,
        request: ContentRequest,
        from: NodeId,
        transport: &T,
        now: u64,
    ) -> RequestOutcome {
        if request.hop_limit == 0 {
            trace!(request_id = hex::encode(request.request_id), "request dropped: hop limit exhausted");
            return RequestOutcome::Dropped(DropReason::HopLimitExhausted);
        }

        if let Some(outer) = request.onion_layers.first() {
            return self.handle_onion_wrapped_request(&request, outer, from, transport, now).await;
        }

        self.serve_or_forward(request, from, transport, now).await
    }

    async fn handle_onion_wrapped_request<T: RouterTransport>(
        &mut self,
        request: &ContentRequest,
        outer_bytes: &[u8],
        from: NodeId,
        transport: &T,
        now: u64,
    ) -> RequestOutcome {
        let layer = match OnionLayer::from_bytes(outer_bytes) {
            Ok(layer) => layer,
            Err(e) => {
                warn!(error = %e, "failed to decode onion layer");
                return RequestOutcome::Dropped(DropReason::OnionPeelFailed);
            }
        };

        let peeled = match cashew_onion::layer::peel_layer(&self.onion_secret, &layer) {
            Ok(peeled) => peeled,
            Err(e) => {
                warn!(error = %e, "failed to peel onion layer");
                return RequestOutcome::Dropped(DropReason::OnionPeelFailed);
            }
        };

        match peeled {
            PeelResult::Relay { next_hop, next_layer_bytes } => {
                if let Err(e) = transport.send_to(next_hop, &next_layer_bytes).await {
                    warn!(peer = %next_hop, error = %e, "failed to relay onion layer");
                }
                RequestOutcome::RelayedOnion { to: next_hop }
            }
            PeelResult::Terminal { payload } => match ContentRequest::from_bytes(&payload) {
                Ok(inner) => Box::pin(self.handle_incoming_request(inner, from, transport, now)).await,
                Err(e) => {
                    warn!(error = %e, "onion payload did not decode as a content request");
                    RequestOutcome::Dropped(DropReason::MalformedInnerRequest)
                }
            },
        }
    }

    async fn serve_or_forward<T: RouterTransport>(
        &mut self,
        request: ContentRequest,
        from: NodeId,
        transport: &T,
        now: u64,
    ) -> RequestOutcome {
        if let Some(content_data) = self.store.get(&request.content_hash) {
            return self.serve_locally(request, content_data, from, transport).await;
        }

        let Some(host) = select_best_host(&self.routing_table, &request.content_hash, now) else {
            trace!(request_id = hex::encode(request.request_id), "request dropped: no route");
            return RequestOutcome::Dropped(DropReason::NoRoute);
        };
        if request.hop_limit <= 1 {
            trace!(request_id = hex::encode(request.request_id), "request dropped: hop limit would underflow");
            return RequestOutcome::Dropped(DropReason::HopLimitExhausted);
        }

        self.pending
            .insert(request.request_id, request.content_hash, Some(from), now);

        let forwarded = request.forwarded();
        if let Err(e) = transport.send_to(host, &forwarded.to_bytes()).await {
            warn!(peer = %host, error = %e, "failed to forward content request");
        }
        RequestOutcome::Forwarded { to: host }
    }

    async fn serve_locally<T: RouterTransport>(
        &self,
        request: ContentRequest,
        content_data: Vec<u8>,
        from: NodeId,
        transport: &T,
    ) -> RequestOutcome {
        let response = match ContentResponse::build(
            &self.signing_key,
            request.content_hash,
            content_data,
            self.local_node_id,
            request.request_id,
        ) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "locally hosted content failed to hash-check before responding");
                return RequestOutcome::Dropped(DropReason::NoRoute);
            }
        };

        if let Err(e) = transport.send_to(from, &response.to_bytes()).await {
            warn!(peer = %from, error = %e, "failed to send content response");
        }
        debug!(request_id = hex::encode(request.request_id), "served content locally");
        RequestOutcome::ServedLocally
    }

    /// Handle a `ContentResponse`. `hosting_key` is the already-resolved
    /// verifying key for `response.hosting_node`.
    pub async fn handle_incoming_response<T: RouterTransport>(
        &mut self,
        response: ContentResponse,
        hosting_key: &VerifyingKey,
        transport: &T,
        now: u64,
    ) -> ResponseOutcome {
        let Some(pending) = self.pending.remove(&response.request_id) else {
            trace!(request_id = hex::encode(response.request_id), "response unmatched");
            return ResponseOutcome::Unmatched;
        };

        let valid = response.validate(hosting_key).is_ok() && response.content_hash == pending.content_hash;
        self.routing_table.update_reliability(response.hosting_node, valid);

        if !valid {
            warn!(
                request_id = hex::encode(response.request_id),
                host = %response.hosting_node,
                "content response failed hash/signature validation, leaving pending request open"
            );
            self.pending
                .insert(pending.request_id, pending.content_hash, pending.reverse_hop, pending.created_at);
            return ResponseOutcome::Mismatched;
        }

        match pending.reverse_hop {
            None => {
                self.invoke_content_received(response.content_hash, response.content_data.clone());
                ResponseOutcome::Delivered
            }
            Some(next) => {
                let forwarded = response.forwarded();
                if let Err(e) = transport.send_to(next, &forwarded.to_bytes()).await {
                    warn!(peer = %next, error = %e, "failed to forward content response");
                }
                ResponseOutcome::Forwarded { to: next }
            }
        }
    }

    /// Periodic maintenance: purge timed-out pending requests (invoking
    /// the not-found callback for those this node originated) and stale
    /// routing entries.
    pub fn cleanup(&mut self, now: u64) {
        for timed_out in self.pending.purge_expired(now) {
            if timed_out.reverse_hop.is_none() {
                self.invoke_not_found(timed_out.content_hash);
            }
        }
        self.routing_table.cleanup(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashew_crypto::ed25519::KeyPair;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MapStore(HashMap<[u8; 32], Vec<u8>>);

    impl ContentStore for MapStore {
        fn get(&self, content_hash: &[u8; 32]) -> Option<Vec<u8>> {
            self.0.get(content_hash).cloned()
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(NodeId, Vec<u8>)>>,
    }

    impl RouterTransport for RecordingTransport {
        async fn send_to(&self, peer: NodeId, frame: &[u8]) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.sent.lock().expect("lock").push((peer, frame.to_vec()));
            Ok(())
        }
    }

    fn node(byte: u8) -> NodeId {
        NodeId::from_bytes([byte; 32])
    }

    fn router_with_store(local: NodeId, store: MapStore) -> (Router<MapStore>, KeyPair) {
        let identity = KeyPair::generate();
        let onion_secret = cashew_crypto::x25519::static_secret_from_signing_key(&identity.signing_key);
        let router = Router::new(local, identity.signing_key.clone(), onion_secret, store);
        (router, identity)
    }

    #[tokio::test]
    async fn test_request_with_no_route_invokes_not_found() {
        let (mut router, _id) = router_with_store(node(0), MapStore::default());
        let called = Arc::new(AtomicUsize::new(0));
        let c = called.clone();
        router.register_not_found_handler(Box::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        let transport = RecordingTransport::default();
        let outcome = router.request_content([1u8; 32], 8, &transport, 1000).await;
        assert_eq!(outcome, RequestOutcome::Dropped(DropReason::NoRoute));
        assert_eq!(called.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_content_sends_to_best_host_and_registers_pending() {
        let (mut router, _id) = router_with_store(node(0), MapStore::default());
        router.routing_table_mut().advertise_content(node(9), [1u8; 32], 1, 1000);

        let transport = RecordingTransport::default();
        let outcome = router.request_content([1u8; 32], 8, &transport, 1000).await;
        assert_eq!(outcome, RequestOutcome::Forwarded { to: node(9) });
        assert_eq!(router.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_when_hop_limit_zero() {
        let (mut router, _id) = router_with_store(node(0), MapStore::default());
        let transport = RecordingTransport::default();
        let req = ContentRequest::new([1u8; 32], node(5), 0, 1000);
        let outcome = router.handle_incoming_request(req, node(5), &transport, 1000).await;
        assert_eq!(outcome, RequestOutcome::Dropped(DropReason::HopLimitExhausted));
    }

    #[tokio::test]
    async fn test_serves_locally_hosted_content() {
        let mut store = MapStore::default();
        let data = b"hello world".to_vec();
        let hash = cashew_crypto::blake3::hash(&data);
        store.0.insert(hash, data);
        let (mut router, _id) = router_with_store(node(0), store);

        let transport = RecordingTransport::default();
        let req = ContentRequest::new(hash, node(5), 8, 1000);
        let outcome = router.handle_incoming_request(req, node(5), &transport, 1000).await;
        assert_eq!(outcome, RequestOutcome::ServedLocally);
        assert_eq!(transport.sent.lock().expect("lock").len(), 1);
        assert_eq!(transport.sent.lock().expect("lock")[0].0, node(5));
    }

    #[tokio::test]
    async fn test_forwards_when_not_hosted_and_route_known() {
        let (mut router, _id) = router_with_store(node(0), MapStore::default());
        router.routing_table_mut().advertise_content(node(9), [7u8; 32], 1, 1000);

        let transport = RecordingTransport::default();
        let req = ContentRequest::new([7u8; 32], node(5), 8, 1000);
        let outcome = router.handle_incoming_request(req.clone(), node(5), &transport, 1000).await;
        assert_eq!(outcome, RequestOutcome::Forwarded { to: node(9) });
        assert_eq!(router.pending().len(), 1);
        assert_eq!(router.pending().get(&req.request_id).unwrap().reverse_hop, Some(node(5)));
    }

    #[tokio::test]
    async fn test_dropped_when_route_known_but_hop_limit_too_low() {
        let (mut router, _id) = router_with_store(node(0), MapStore::default());
        router.routing_table_mut().advertise_content(node(9), [7u8; 32], 1, 1000);

        let transport = RecordingTransport::default();
        let req = ContentRequest::new([7u8; 32], node(5), 1, 1000);
        let outcome = router.handle_incoming_request(req, node(5), &transport, 1000).await;
        assert_eq!(outcome, RequestOutcome::Dropped(DropReason::HopLimitExhausted));
    }

    #[tokio::test]
    async fn test_response_delivered_to_originator_updates_reliability() {
        let (mut router, _id) = router_with_store(node(0), MapStore::default());
        let data = b"payload".to_vec();
        let hash = cashew_crypto::blake3::hash(&data);
        router.routing_table_mut().advertise_content(node(9), hash, 1, 1000);

        let transport = RecordingTransport::default();
        let outcome = router.request_content(hash, 8, &transport, 1000).await;
        assert_eq!(outcome, RequestOutcome::Forwarded { to: node(9) });
        let request_id = *router.pending().ids().first().expect("one pending");

        let called = Arc::new(AtomicUsize::new(0));
        let c = called.clone();
        router.register_content_received_handler(Box::new(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        let host_identity = KeyPair::generate();
        let response = ContentResponse::build(&host_identity.signing_key, hash, data, node(9), request_id).expect("build");
        let outcome = router
            .handle_incoming_response(response, &host_identity.verifying_key, &transport, 1000)
            .await;
        assert_eq!(outcome, ResponseOutcome::Delivered);
        assert_eq!(called.load(Ordering::SeqCst), 1);
        assert!(router.routing_table().entry(node(9)).expect("entry").reliability > 1.0 - 1e-9);
    }

    #[tokio::test]
    async fn test_response_forwarded_along_reverse_hop() {
        let (mut router, _id) = router_with_store(node(0), MapStore::default());
        router.routing_table_mut().advertise_content(node(9), [7u8; 32], 1, 1000);
        let transport = RecordingTransport::default();
        let req = ContentRequest::new([7u8; 32], node(5), 8, 1000);
        router.handle_incoming_request(req.clone(), node(5), &transport, 1000).await;

        let host_identity = KeyPair::generate();
        let data = b"payload".to_vec();
        let hash = cashew_crypto::blake3::hash(&data);
        let response = ContentResponse::build(&host_identity.signing_key, hash, data, node(9), req.request_id).expect("build");
        let outcome = router
            .handle_incoming_response(response, &host_identity.verifying_key, &transport, 1000)
            .await;
        assert_eq!(outcome, ResponseOutcome::Forwarded { to: node(5) });
    }

    #[tokio::test]
    async fn test_response_unmatched_when_no_pending() {
        let (mut router, _id) = router_with_store(node(0), MapStore::default());
        let transport = RecordingTransport::default();
        let host_identity = KeyPair::generate();
        let data = b"payload".to_vec();
        let hash = cashew_crypto::blake3::hash(&data);
        let response = ContentResponse::build(&host_identity.signing_key, hash, data, node(9), [3u8; 32]).expect("build");
        let outcome = router
            .handle_incoming_response(response, &host_identity.verifying_key, &transport, 1000)
            .await;
        assert_eq!(outcome, ResponseOutcome::Unmatched);
    }

    #[tokio::test]
    async fn test_mismatched_hash_does_not_invoke_callback_and_leaves_pending_open() {
        let (mut router, _id) = router_with_store(node(0), MapStore::default());
        router.routing_table_mut().advertise_content(node(9), [1u8; 32], 1, 1000);
        let transport = RecordingTransport::default();
        router.request_content([1u8; 32], 8, &transport, 1000).await;
        let request_id = *router.pending().ids().first().expect("pending");

        let called = Arc::new(AtomicUsize::new(0));
        let c = called.clone();
        router.register_content_received_handler(Box::new(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        let host_identity = KeyPair::generate();
        let data = b"real".to_vec();
        let hash = cashew_crypto::blake3::hash(&data);
        let mut response = ContentResponse::build(&host_identity.signing_key, hash, data, node(9), request_id).expect("build");
        response.content_data = b"tampered!".to_vec();

        let outcome = router
            .handle_incoming_response(response, &host_identity.verifying_key, &transport, 1000)
            .await;
        assert_eq!(outcome, ResponseOutcome::Mismatched);
        assert_eq!(called.load(Ordering::SeqCst), 0);
        // Integrity mismatch: the pending request stays open for a possible future correct response.
        assert!(router.pending().get(&request_id).is_some());
        assert!(router.routing_table().entry(node(9)).expect("entry").reliability < 1.0 - 1e-9);
    }

    #[tokio::test]
    async fn test_cleanup_purges_timed_out_pending_and_invokes_not_found() {
        let (mut router, _id) = router_with_store(node(0), MapStore::default());
        router.routing_table_mut().advertise_content(node(9), [1u8; 32], 1, 1000);
        let transport = RecordingTransport::default();
        router.request_content([1u8; 32], 8, &transport, 1000).await;

        let called = Arc::new(AtomicUsize::new(0));
        let c = called.clone();
        router.register_not_found_handler(Box::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        router.cleanup(1000 + crate::PENDING_REQUEST_TIMEOUT_SECS);
        assert_eq!(called.load(Ordering::SeqCst), 1);
        assert!(router.pending().is_empty());
    }
}
