//! The deterministic, entity-scoped state committed at each height (§3).

use crate::account::AccountMachine;
use crate::config::EntityConfig;
use crate::ids::{EntityId, ProposalId, SignerId, TokenId};
use crate::ordered_map::OrderedMap;
use crate::proposal::Proposal;
use crate::reserve::Reserve;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An idempotency key guarding `processed_requests` (I6): membership is
/// monotone, and re-applying a known key is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize)]
pub enum ProcessedKey {
    AnchorEvent {
        block_number: u64,
        transaction_hash: [u8; 32],
        event_index: u32,
    },
    CrossEntityRequest {
        request_id: [u8; 32],
    },
}

/// Entity-scoped, deterministic state (§3).
///
/// Every collection here that participates in consensus-critical iteration
/// is either a `BTreeMap`/`BTreeSet` (sorted-key order) or an `OrderedMap`
/// (insertion order) per §4.2's determinism rule — never a `HashMap`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EntityState {
    pub height: u64,
    pub timestamp: u64,
    pub nonces: BTreeMap<SignerId, u64>,
    pub messages: Vec<String>,
    pub proposals: OrderedMap<ProposalId, Proposal>,
    pub reserves: BTreeMap<TokenId, Reserve>,
    pub accounts: BTreeMap<EntityId, AccountMachine>,
    pub config: EntityConfig,
    pub j_block: u64,
    pub processed_requests: BTreeSet<ProcessedKey>,
}

impl EntityState {
    /// The zeroed state an `importReplica` server transaction instantiates
    /// (§4.5 step 4): height 0, jBlock 0, empty reserves/accounts.
    pub fn genesis(config: EntityConfig) -> Self {
        EntityState {
            height: 0,
            timestamp: 0,
            nonces: BTreeMap::new(),
            messages: Vec::new(),
            proposals: OrderedMap::new(),
            reserves: BTreeMap::new(),
            accounts: BTreeMap::new(),
            config,
            j_block: 0,
            processed_requests: BTreeSet::new(),
        }
    }

    pub fn bump_nonce(&mut self, signer: &SignerId) {
        let entry = self.nonces.entry(signer.clone()).or_insert(0);
        *entry += 1;
    }
}
