#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]
//! Core data model, error taxonomy, and canonical codec for the XLN entity
//! replication layer: entities, replicas, bilateral accounts, and the
//! transactions/inputs that flow between them (§3).

pub mod account;
pub mod codec;
pub mod config;
pub mod delta;
pub mod entity_state;
pub mod error;
pub mod events;
pub mod frame;
pub mod ids;
pub mod input;
pub mod ordered_map;
pub mod prelude;
pub mod proposal;
pub mod replica;
pub mod reserve;
pub mod signature;
pub mod tx;

pub use account::{AccountFrame, AccountMachine, AccountTx, CreditLimits, ProofBody, ProofHeader};
pub use config::{ConsensusMode, EntityConfig};
pub use delta::Delta;
pub use entity_state::{EntityState, ProcessedKey};
pub use events::AnchorEvent;
pub use frame::ProposedFrame;
pub use ids::{EntityId, JurisdictionId, ProposalId, SignerId, TokenId};
pub use input::EntityInput;
pub use ordered_map::OrderedMap;
pub use proposal::{Proposal, ProposalStatus, VoteChoice};
pub use replica::Replica;
pub use reserve::Reserve;
pub use signature::{DeterministicSigner, Signature, Signer};
pub use tx::{EntityTx, ProfileUpdate};

/// Platform-wide liveness and resource bounds (§5).
pub mod limits {
    pub const MEMPOOL_CAP: usize = 10_000;
    pub const MAX_TXS_PER_INPUT: usize = 1_000;
    pub const MAX_PRECOMMITS_PER_INPUT: usize = 100;
    pub const MAX_ENTITY_INPUTS_PER_TICK: usize = 10_000;
    pub const MAX_SERVER_TXS_PER_TICK: usize = 1_000;
    pub const MAX_CASCADE_ITERATIONS: usize = 10;
    /// §4.3's "large batch" diagnostic threshold (distinct from the hard
    /// `MAX_TXS_PER_INPUT` bound above).
    pub const LARGE_BATCH_DIAGNOSTIC_THRESHOLD: usize = 3;
    pub const FRAME_TIMESTAMP_DRIFT_MS: u64 = 30_000;
}
