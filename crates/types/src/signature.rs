//! An opaque signature primitive.
//!
//! §9 Open Questions: the system this spec describes signs frames with
//! "Hanko" signature aggregation, treated here as an opaque black box (§1).
//! `Signature` is therefore a plain byte string, and the `Signer` trait is
//! the only seam a real aggregation scheme would plug into. The
//! `DeterministicSigner` below is a placeholder suitable for tests and
//! single-process deployments; it is not a cryptographic primitive.

use crate::ids::SignerId;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An opaque signature over a frame hash or other digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Produces a `Signature` for a signer over an arbitrary message.
///
/// Implementations are not required to be verifiable by anyone other than
/// themselves; the Consensus Engine only ever compares signature bytes for
/// equality (the Byzantine double-sign check, §4.3), never re-derives a
/// public key from them.
pub trait Signer: Send + Sync {
    fn sign(&self, signer: &SignerId, message: &[u8]) -> Signature;
}

/// A signer whose output is a deterministic function of `(signer, message)`.
///
/// Two independent replicas holding the same `DeterministicSigner` produce
/// byte-identical signatures for byte-identical inputs, which is what the
/// determinism invariant (§8, property 1) requires of everything on the
/// consensus-critical path.
#[derive(Debug, Clone, Default)]
pub struct DeterministicSigner;

impl Signer for DeterministicSigner {
    fn sign(&self, signer: &SignerId, message: &[u8]) -> Signature {
        let mut hasher = Sha256::new();
        hasher.update(signer.0.as_bytes());
        hasher.update(b":");
        hasher.update(message);
        Signature(hasher.finalize().to_vec())
    }
}
