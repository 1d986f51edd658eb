//! A per-`(entity, signer)` consensus participant (§3, `Replica`).

use crate::entity_state::EntityState;
use crate::frame::ProposedFrame;
use crate::tx::EntityTx;

/// One `(entity, signer)` instance of the entity state machine.
///
/// Replicas are created by `importReplica` and, per the lifecycle rule in
/// §3, never destroyed afterward — only snapshotted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replica {
    pub state: EntityState,
    pub mempool: Vec<EntityTx>,
    /// The proposal this replica is currently building/aggregating
    /// signatures for. Only ever `Some` on the proposer in `ProposerBased`
    /// mode; any validator may hold one transiently in `GossipBased` mode.
    pub proposal: Option<ProposedFrame>,
    /// The frame this validator has signed at the current height and must
    /// not abandon for a competing frame until commit or reset (I5).
    pub locked_frame: Option<ProposedFrame>,
    pub is_proposer: bool,
}

impl Replica {
    pub fn new(state: EntityState, is_proposer: bool) -> Self {
        Replica {
            state,
            mempool: Vec::new(),
            proposal: None,
            locked_frame: None,
            is_proposer,
        }
    }
}
