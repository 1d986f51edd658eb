//! The fixed, immutable-per-replica consensus configuration of an entity.

use crate::ids::{JurisdictionId, SignerId};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selects how a `Replica` drives consensus for its entity (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsensusMode {
    /// The first validator in `validators` is the sole proposer.
    ProposerBased,
    /// Every validator broadcasts its precommit to every other validator.
    GossipBased,
}

/// The fixed consensus configuration of an entity (§3).
///
/// `validators` is ordered; `validators[0]` is the proposer in
/// `ProposerBased` mode (§4.3, Proposer in the glossary). `shares` assigns
/// voting power per signer; `threshold` is the minimum accumulated power
/// required to commit a frame (I4) or pass a governance proposal.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EntityConfig {
    pub mode: ConsensusMode,
    pub validators: Vec<SignerId>,
    pub threshold: u64,
    pub shares: BTreeMap<SignerId, u64>,
    pub jurisdiction: JurisdictionId,
}

impl EntityConfig {
    /// Single-signer, threshold-1 entities take the fast path (§4.3 step 7).
    pub fn is_single_signer(&self) -> bool {
        self.validators.len() == 1 && self.threshold <= 1
    }

    /// The sole proposer in `ProposerBased` mode: `validators[0]`.
    pub fn proposer(&self) -> Option<&SignerId> {
        self.validators.first()
    }

    pub fn is_proposer(&self, signer: &SignerId) -> bool {
        self.proposer() == Some(signer)
    }

    /// Sum of `shares[s]` over an arbitrary set of signers (I4's quorum sum).
    ///
    /// Each signer is counted at most once even if `signers` repeats it,
    /// since a repeated signature carries no additional power (I5).
    pub fn power_of<'a, I: IntoIterator<Item = &'a SignerId>>(&self, signers: I) -> u128 {
        let mut counted = std::collections::BTreeSet::new();
        let mut power: u128 = 0;
        for s in signers {
            if counted.insert(s) {
                power += u128::from(*self.shares.get(s).unwrap_or(&0));
            }
        }
        power
    }

    pub fn total_power(&self) -> u128 {
        self.shares.values().map(|p| u128::from(*p)).sum()
    }

    pub fn has_quorum(&self, power: u128) -> bool {
        power >= u128::from(self.threshold)
    }
}
