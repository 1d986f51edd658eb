//! Stable identifiers used throughout the entity replication layer.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte identifier addressing an entity on the anchor chain.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Encode,
    Decode,
    Serialize,
    Deserialize,
)]
pub struct EntityId(pub [u8; 32]);

impl EntityId {
    pub const ZERO: EntityId = EntityId([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        EntityId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("entity id must be 32 bytes of hex")]
pub struct ParseEntityIdError;

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| ParseEntityIdError)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| ParseEntityIdError)?;
        Ok(EntityId(arr))
    }
}

/// Identifies a validator (a signer) within an entity's `Config`.
///
/// Cryptographic key derivation is out of scope here (§1); a `SignerId` is
/// an opaque, stable label the `Signer` primitive and `Config.shares` key
/// off of.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize,
)]
pub struct SignerId(pub String);

impl SignerId {
    pub fn new(s: impl Into<String>) -> Self {
        SignerId(s.into())
    }
}

impl fmt::Display for SignerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SignerId {
    fn from(s: &str) -> Self {
        SignerId(s.to_string())
    }
}

/// Identifies a token within an entity's reserves and bilateral deltas.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize,
)]
pub struct TokenId(pub u64);

/// Identifies a governance proposal within an `EntityState`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize,
)]
pub struct ProposalId(pub u64);

/// References the jurisdiction (anchor chain) an entity's `Config` is bound to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct JurisdictionId(pub String);

impl JurisdictionId {
    pub fn new(s: impl Into<String>) -> Self {
        JurisdictionId(s.into())
    }
}
