//! A proposed (and, once signed past threshold, committed) batch of
//! entity transactions (§3, `ProposedFrame`).

use crate::entity_state::EntityState;
use crate::ids::SignerId;
use crate::signature::Signature;
use crate::tx::EntityTx;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ProposedFrame {
    pub height: u64,
    pub txs: Vec<EntityTx>,
    pub hash: [u8; 32],
    /// The state the commit will adopt verbatim (already bumped to
    /// `height`/`timestamp`), precomputed by the proposer via the Entity
    /// State Machine so every validator commits byte-identical state (§8,
    /// property 1) without re-executing the frame themselves.
    pub new_state: EntityState,
    pub signatures: BTreeMap<SignerId, Signature>,
}
