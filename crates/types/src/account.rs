//! Per-counterparty bilateral account state (§3, `AccountMachine`).
//!
//! §9 Open Questions: the account sub-machine's own pairwise consensus
//! (propose/precommit/commit between exactly two entities) is deliberately
//! abstracted by this spec — "the hard part is C3, not the pair." This
//! module therefore models the shape `AccountMachine` needs (mempool,
//! deltas, a running frame, a pending frame) without implementing a second
//! consensus engine; `AccountTx` carries an opaque payload rather than a
//! typed bilateral-protocol message set.

use crate::delta::Delta;
use crate::ids::{EntityId, TokenId};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A message queued for the (out-of-scope) bilateral consensus sub-machine.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AccountTx {
    pub payload: Vec<u8>,
}

/// The entity-local view of the two-party credit limits for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize, Default)]
pub struct CreditLimits {
    pub own_limit: i128,
    pub peer_limit: i128,
}

/// Metadata binding `proof_body` to a specific counterparty pair.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ProofHeader {
    pub from_entity: EntityId,
    pub to_entity: EntityId,
    pub cooperative_nonce: u64,
}

/// A flattened, orderable view over `deltas` suitable for bilateral proof
/// exchange; `token_ids[i]` corresponds to `deltas[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize, Default)]
pub struct ProofBody {
    pub token_ids: Vec<TokenId>,
    pub deltas: Vec<Delta>,
}

/// A batch of `AccountTx` agreed (or proposed) at a given account height.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AccountFrame {
    pub height: u64,
    pub txs: Vec<AccountTx>,
    pub hash: [u8; 32],
}

/// The per-counterparty sub-state of an `EntityState` (§3).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AccountMachine {
    pub mempool: Vec<AccountTx>,
    pub deltas: BTreeMap<TokenId, Delta>,
    pub global_credit_limits: CreditLimits,
    pub proof_header: ProofHeader,
    pub proof_body: ProofBody,
    /// The last frame this account machine and its counterparty agreed on.
    pub current_frame: Option<AccountFrame>,
    /// A frame awaiting the (out-of-scope) bilateral consensus sub-machine.
    pub pending_frame: Option<AccountFrame>,
}

impl AccountMachine {
    /// Initializes a fresh account with no collateral or credit, per
    /// `openAccount`'s "initialize ... using defaults" (§4.2).
    pub fn new_default(from_entity: EntityId, to_entity: EntityId) -> Self {
        AccountMachine {
            mempool: Vec::new(),
            deltas: BTreeMap::new(),
            global_credit_limits: CreditLimits::default(),
            proof_header: ProofHeader {
                from_entity,
                to_entity,
                cooperative_nonce: 0,
            },
            proof_body: ProofBody::default(),
            current_frame: None,
            pending_frame: None,
        }
    }
}
