//! The closed transaction taxonomy an entity's state machine accepts (§4.2).

use crate::events::AnchorEvent;
use crate::ids::{EntityId, ProposalId, SignerId};
use crate::proposal::VoteChoice;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A profile announcement authorized by `profile-update` (§4.2). The
/// Runtime Kernel forwards this to the (out-of-scope) profile store; no
/// entity-state field is mutated by it beyond the authorization itself.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub metadata: Option<Vec<u8>>,
}

/// The closed set of transaction types an `EntityState` can apply (§4.2).
///
/// Any tag outside this set is a `ValidationError` at the entity-input
/// validation boundary (§7), never reaches `apply_entity_tx`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum EntityTx {
    /// Append a message to `EntityState.messages`.
    Chat { from: SignerId, message: String },
    /// Insert a new `Proposal` into `EntityState.proposals`.
    Propose {
        proposer: SignerId,
        proposal_id: ProposalId,
        title: String,
        action: Vec<u8>,
    },
    /// Record a vote on an existing proposal; may advance its lifecycle.
    Vote {
        signer: SignerId,
        proposal_id: ProposalId,
        choice: VoteChoice,
    },
    /// Authorize a profile announce; no other state effect.
    ProfileUpdate {
        signer: SignerId,
        profile: ProfileUpdate,
    },
    /// Absorb an anchor-chain event, idempotent by `(block_number,
    /// transaction_hash, event_index)` against `processed_requests` (I6).
    JEvent {
        block_number: u64,
        transaction_hash: [u8; 32],
        event_index: u32,
        event: AnchorEvent,
    },
    /// Deliver a bilateral message to the named counterparty's
    /// `AccountMachine` mempool.
    AccountInput {
        counterparty: EntityId,
        payload: Vec<u8>,
    },
    /// Initialize an `AccountMachine` with a counterparty using defaults.
    OpenAccount { counterparty: EntityId },
}

impl EntityTx {
    /// A short, stable label for diagnostics and logging; never persisted.
    pub fn kind(&self) -> &'static str {
        match self {
            EntityTx::Chat { .. } => "chat",
            EntityTx::Propose { .. } => "propose",
            EntityTx::Vote { .. } => "vote",
            EntityTx::ProfileUpdate { .. } => "profile-update",
            EntityTx::JEvent { .. } => "j_event",
            EntityTx::AccountInput { .. } => "accountInput",
            EntityTx::OpenAccount { .. } => "openAccount",
        }
    }
}
