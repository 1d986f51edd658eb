//! The consensus unit exchanged between replicas and the Runtime Kernel
//! (§3, `EntityInput`).

use crate::frame::ProposedFrame;
use crate::ids::{EntityId, SignerId};
use crate::signature::Signature;
use crate::tx::EntityTx;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One unit of consensus traffic addressed to a single `(entity_id,
/// signer_id)` replica.
///
/// Which combination of fields is populated determines its meaning
/// (§3): `entity_txs` only is a mempool push, `proposed_frame` only is a
/// proposal, `precommits` only is a vote, and `proposed_frame` +
/// `precommits` reaching quorum is a commit notification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
pub struct EntityInput {
    pub entity_id: EntityId,
    pub signer_id: SignerId,
    pub entity_txs: Option<Vec<EntityTx>>,
    pub proposed_frame: Option<ProposedFrame>,
    pub precommits: Option<BTreeMap<SignerId, Signature>>,
    pub metadata: Option<Vec<u8>>,
}

impl EntityInput {
    pub fn mempool_push(entity_id: EntityId, signer_id: SignerId, txs: Vec<EntityTx>) -> Self {
        EntityInput {
            entity_id,
            signer_id,
            entity_txs: Some(txs),
            proposed_frame: None,
            precommits: None,
            metadata: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        let txs_empty = self.entity_txs.as_ref().map_or(true, |t| t.is_empty());
        let precommits_empty = self.precommits.as_ref().map_or(true, |p| p.is_empty());
        txs_empty && self.proposed_frame.is_none() && precommits_empty
    }
}
