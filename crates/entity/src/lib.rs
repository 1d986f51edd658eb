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
//! The entity state machine (§4.2): `apply_entity_frame`/`apply_entity_tx`
//! over the closed, eight-variant transaction taxonomy.
//!
//! Neither function ever panics or returns an error for a malformed or
//! unauthorized transaction — per §4.2's failure policy, such a
//! transaction is dropped silently with an appended diagnostic
//! [`Output::Diagnostic`], and the frame continues processing the rest.
//! This is what keeps independent replicas byte-identical (§8, property 1):
//! there is no code path where one replica errors out and another doesn't.

mod txs;

use xln_types::{EntityId, EntityState, ProfileUpdate, SignerId};

pub use txs::apply_entity_tx;

/// A side effect of applying one transaction or frame, routed by the
/// Runtime Kernel to out-of-scope subsystems (§4.2, §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A diagnostic for a dropped, malformed, or otherwise noteworthy
    /// transaction. Never aborts the frame; purely observational (§7).
    Diagnostic(String),
    /// A `profile-update` transaction's authorization, forwarded to the
    /// (out-of-scope) profile store (§4.2, §6).
    ProfileAnnounce {
        entity_id: EntityId,
        signer: SignerId,
        profile: ProfileUpdate,
    },
}

/// Applies a batch of transactions as one committed frame (§4.2).
///
/// `timestamp` is the proposer-chosen wall-clock value that becomes part
/// of the committed state (§4.3); callers validate it against the drift
/// window *before* calling this, since by the time a frame reaches here
/// it has already been accepted.
pub fn apply_entity_frame(
    entity_id: EntityId,
    state: &EntityState,
    txs: &[xln_types::EntityTx],
    height: u64,
    timestamp: u64,
) -> (EntityState, Vec<Output>) {
    let mut next = state.clone();
    next.height = height;
    next.timestamp = timestamp;

    let mut outputs = Vec::new();
    for tx in txs {
        let (after, mut tx_outputs) = apply_entity_tx(entity_id, &next, tx);
        next = after;
        outputs.append(&mut tx_outputs);
    }
    (next, outputs)
}
