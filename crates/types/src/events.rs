//! Anchor-chain event shapes consumed via `j_event` transactions (§6).

use crate::ids::{EntityId, TokenId};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// An event emitted by the `EntityProvider` or `Depository` anchor contracts.
///
/// Each variant corresponds to one row of §6's event table. The anchor
/// contracts themselves are out of scope (§1); this is only the payload
/// shape the indexer hands to `j_event`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum AnchorEvent {
    EntityRegistered {
        entity_id: EntityId,
        entity_number: u64,
        board_hash: [u8; 32],
    },
    ControlSharesReleased {
        entity_id: EntityId,
        depository: EntityId,
        control_amount: i128,
        dividend_amount: i128,
        purpose: String,
    },
    NameAssigned {
        name: String,
        entity_number: u64,
    },
    ReserveUpdated {
        entity: EntityId,
        token_id: TokenId,
        new_balance: i128,
    },
    ReserveTransferred {
        from: EntityId,
        to: EntityId,
        token_id: TokenId,
        amount: i128,
    },
    SettlementProcessed {
        left_entity: EntityId,
        right_entity: EntityId,
        token_id: TokenId,
        left_reserve: i128,
        right_reserve: i128,
        collateral: i128,
        ondelta: i128,
    },
}

impl AnchorEvent {
    /// The entity (if any) whose `EntityState` this event should be routed
    /// to on ingestion. `SettlementProcessed` touches two entities; routing
    /// duplicates the `j_event` tx to both (handled by the runtime kernel).
    pub fn primary_entity(&self) -> Option<EntityId> {
        match self {
            AnchorEvent::EntityRegistered { entity_id, .. } => Some(*entity_id),
            AnchorEvent::ControlSharesReleased { entity_id, .. } => Some(*entity_id),
            AnchorEvent::NameAssigned { .. } => None,
            AnchorEvent::ReserveUpdated { entity, .. } => Some(*entity),
            AnchorEvent::ReserveTransferred { from, .. } => Some(*from),
            AnchorEvent::SettlementProcessed { left_entity, .. } => Some(*left_entity),
        }
    }

    /// A second entity this event must also be delivered to, if any.
    pub fn secondary_entity(&self) -> Option<EntityId> {
        match self {
            AnchorEvent::ReserveTransferred { to, .. } => Some(*to),
            AnchorEvent::SettlementProcessed { right_entity, .. } => Some(*right_entity),
            _ => None,
        }
    }
}
