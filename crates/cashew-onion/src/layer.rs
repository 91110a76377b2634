//! Wire format and crypto for a single onion layer.

use cashew_crypto::chacha20::{self, NONCE_SIZE, TAG_SIZE};
use cashew_crypto::x25519::{PublicKey, StaticSecret};
use cashew_types::wire::{Reader, Writer};
use cashew_types::NodeId;

use crate::path::PathHop;
use crate::{OnionError, Result};

/// Tag prefixing a peeled layer's plaintext: terminal (deliver here) or
/// relay (peel again at `next_hop`). Resolves the ambiguity of the
/// original construction, which tried to distinguish the two cases by
/// re-parsing the plaintext and catching failure.
const TAG_TERMINAL: u8 = 0x00;
const TAG_RELAY: u8 = 0x01;

/// Fixed all-zero nonce: the key is a fresh Diffie-Hellman output derived
/// from a one-time ephemeral secret generated per layer, so it is never
/// reused under the same key.
const LAYER_NONCE: [u8; NONCE_SIZE] = [0u8; NONCE_SIZE];

/// A single encrypted onion layer as it travels on the wire:
/// `32 ephemeral_pk ∥ u32 ct_len ∥ ct ∥ 16 mac`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OnionLayer {
    pub ephemeral_pk: PublicKey,
    pub ciphertext: Vec<u8>,
    pub mac: [u8; TAG_SIZE],
}

/// Outcome of peeling one layer off a circuit.
#[derive(Debug, PartialEq, Eq)]
pub enum PeelResult {
    /// This node is the destination; here is the original payload.
    Terminal { payload: Vec<u8> },
    /// Forward `next_layer_bytes` (the still-encoded remainder of the
    /// circuit) to `next_hop`.
    Relay {
        next_hop: NodeId,
        next_layer_bytes: Vec<u8>,
    },
}

impl OnionLayer {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(32 + 4 + self.ciphertext.len() + TAG_SIZE);
        w.bytes(self.ephemeral_pk.as_bytes())
            .len_prefixed(&self.ciphertext)
            .bytes(&self.mac);
        w.into_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let ephemeral_pk = PublicKey::from_bytes(&r.array::<32>()?);
        let ciphertext = r.len_prefixed()?.to_vec();
        let mac = r.array::<TAG_SIZE>()?;
        r.finish()?;
        Ok(Self {
            ephemeral_pk,
            ciphertext,
            mac,
        })
    }

    fn seal(ephemeral_pk: PublicKey, ct_and_tag: Vec<u8>) -> Self {
        let split = ct_and_tag.len() - TAG_SIZE;
        let mut mac = [0u8; TAG_SIZE];
        mac.copy_from_slice(&ct_and_tag[split..]);
        Self {
            ephemeral_pk,
            ciphertext: ct_and_tag[..split].to_vec(),
            mac,
        }
    }

    fn combined_ciphertext(&self) -> Vec<u8> {
        let mut combined = self.ciphertext.clone();
        combined.extend_from_slice(&self.mac);
        combined
    }
}

/// Seal `plaintext` under a fresh per-layer ephemeral keypair and `pk`,
/// the recipient's static onion key.
fn seal_layer(pk: PublicKey, plaintext: &[u8]) -> Result<OnionLayer> {
    let (ephemeral_sk, ephemeral_pk) = cashew_crypto::x25519::ephemeral_keypair();
    let shared = ephemeral_sk.diffie_hellman(&pk);
    let sealed = chacha20::encrypt(shared.as_bytes(), &LAYER_NONCE, plaintext, &[])?;
    Ok(OnionLayer::seal(ephemeral_pk, sealed))
}

/// Build a full onion circuit to `path.last()` carrying `payload`, working
/// destination-inward: the innermost layer is addressed to the
/// destination, the outermost to `path[0]` (the first hop the caller must
/// send the result to).
///
/// The loop carries the previous iteration's sealed layer directly rather
/// than through an `Option`, so there is no absent-value case to recover
/// from: the terminal layer (addressed to `path.last()`) seeds `current`,
/// and each remaining hop, walked innermost-out, seals the prior layer's
/// bytes behind a fresh one.
pub fn build_layers(path: &[PathHop], payload: &[u8]) -> Result<OnionLayer> {
    if path.is_empty() {
        return Err(OnionError::EmptyPath);
    }

    let last = path.len() - 1;
    let mut terminal_plaintext = Vec::with_capacity(1 + payload.len());
    terminal_plaintext.push(TAG_TERMINAL);
    terminal_plaintext.extend_from_slice(payload);
    let mut current = seal_layer(path[last].x25519_pk, &terminal_plaintext)?;

    for i in (0..last).rev() {
        let next_hop = path[i + 1].node_id;
        let inner = current.to_bytes();
        let mut relay_plaintext = Vec::with_capacity(1 + 32 + inner.len());
        relay_plaintext.push(TAG_RELAY);
        relay_plaintext.extend_from_slice(next_hop.as_bytes());
        relay_plaintext.extend_from_slice(&inner);
        current = seal_layer(path[i].x25519_pk, &relay_plaintext)?;
    }

    Ok(current)
}

/// Peel one layer using `our_secret`, the receiving node's static onion
/// secret. Returns the plaintext and a decision on whether to deliver it
/// locally or relay it onward.
pub fn peel_layer(our_secret: &StaticSecret, layer: &OnionLayer) -> Result<PeelResult> {
    let shared = our_secret.diffie_hellman(&layer.ephemeral_pk);
    let combined = layer.combined_ciphertext();
    let plaintext = chacha20::decrypt(shared.as_bytes(), &LAYER_NONCE, &combined, &[])?;

    let tag = *plaintext.first().ok_or(OnionError::UnknownTag(0))?;
    match tag {
        TAG_TERMINAL => Ok(PeelResult::Terminal {
            payload: plaintext[1..].to_vec(),
        }),
        TAG_RELAY => {
            if plaintext.len() < 33 {
                return Err(cashew_types::wire::WireError::Underflow {
                    needed: 33,
                    available: plaintext.len(),
                }
                .into());
            }
            let mut node_bytes = [0u8; 32];
            node_bytes.copy_from_slice(&plaintext[1..33]);
            Ok(PeelResult::Relay {
                next_hop: NodeId::from_bytes(node_bytes),
                next_layer_bytes: plaintext[33..].to_vec(),
            })
        }
        other => Err(OnionError::UnknownTag(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashew_crypto::x25519::StaticSecret as Secret;

    struct TestHop {
        hop: PathHop,
        secret: Secret,
    }

    fn make_hop(byte: u8) -> TestHop {
        let secret = Secret::generate();
        let public = secret.public_key();
        TestHop {
            hop: PathHop {
                node_id: NodeId::from_bytes([byte; 32]),
                x25519_pk: public,
            },
            secret,
        }
    }

    #[test]
    fn test_layer_round_trip_encoding() {
        let hop = make_hop(1);
        let layer = build_layers(&[hop.hop], b"hello").expect("build");
        let bytes = layer.to_bytes();
        let decoded = OnionLayer::from_bytes(&bytes).expect("decode");
        assert_eq!(decoded, layer);
    }

    #[test]
    fn test_single_hop_peels_to_terminal() {
        let hop = make_hop(1);
        let layer = build_layers(&[hop.hop], b"payload-bytes").expect("build");
        let result = peel_layer(&hop.secret, &layer).expect("peel");
        assert_eq!(
            result,
            PeelResult::Terminal {
                payload: b"payload-bytes".to_vec()
            }
        );
    }

    #[test]
    fn test_multi_hop_peels_in_order_to_destination() {
        let h1 = make_hop(1);
        let h2 = make_hop(2);
        let h3 = make_hop(3);
        let path = vec![h1.hop, h2.hop, h3.hop];
        let outer = build_layers(&path, b"secret-message").expect("build");

        let peel1 = peel_layer(&h1.secret, &outer).expect("peel1");
        let (next_hop, next_bytes) = match peel1 {
            PeelResult::Relay {
                next_hop,
                next_layer_bytes,
            } => (next_hop, next_layer_bytes),
            other => panic!("expected relay, got {other:?}"),
        };
        assert_eq!(next_hop, h2.hop.node_id);

        let layer2 = OnionLayer::from_bytes(&next_bytes).expect("decode layer2");
        let peel2 = peel_layer(&h2.secret, &layer2).expect("peel2");
        let (next_hop2, next_bytes2) = match peel2 {
            PeelResult::Relay {
                next_hop,
                next_layer_bytes,
            } => (next_hop, next_layer_bytes),
            other => panic!("expected relay, got {other:?}"),
        };
        assert_eq!(next_hop2, h3.hop.node_id);

        let layer3 = OnionLayer::from_bytes(&next_bytes2).expect("decode layer3");
        let peel3 = peel_layer(&h3.secret, &layer3).expect("peel3");
        assert_eq!(
            peel3,
            PeelResult::Terminal {
                payload: b"secret-message".to_vec()
            }
        );
    }

    #[test]
    fn test_intermediate_hop_cannot_read_payload() {
        let h1 = make_hop(1);
        let h2 = make_hop(2);
        let path = vec![h1.hop, h2.hop];
        let outer = build_layers(&path, b"payload").expect("build");

        let peel1 = peel_layer(&h1.secret, &outer).expect("peel1");
        match peel1 {
            PeelResult::Relay { next_layer_bytes, .. } => {
                assert_ne!(next_layer_bytes, b"payload".to_vec());
            }
            other => panic!("expected relay, got {other:?}"),
        }
    }

    #[test]
    fn test_tampered_ciphertext_fails_to_peel() {
        let hop = make_hop(1);
        let mut layer = build_layers(&[hop.hop], b"payload").expect("build");
        layer.ciphertext[0] ^= 0xff;
        assert!(peel_layer(&hop.secret, &layer).is_err());
    }

    #[test]
    fn test_wrong_secret_fails_to_peel() {
        let hop = make_hop(1);
        let other = Secret::generate();
        let layer = build_layers(&[hop.hop], b"payload").expect("build");
        assert!(peel_layer(&other, &layer).is_err());
    }
}
