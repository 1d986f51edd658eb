//! The per-token bilateral position between an entity and one counterparty.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// One token's position within an `AccountMachine` (§3).
///
/// `collateral` is on-chain-locked and must never go negative (I3).
/// `ondelta + offdelta` is the signed position: positive means the left
/// side (the lower-sorted entity id of the pair, by convention) owes the
/// right side. `left_allowance`/`right_allowance` are carried per §9's
/// open question — defined, arithmetically wired into `deriveDelta`, but
/// never mutated by any transaction in this spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Delta {
    pub collateral: i128,
    pub ondelta: i128,
    pub offdelta: i128,
    pub left_credit_limit: i128,
    pub right_credit_limit: i128,
    pub left_allowance: i128,
    pub right_allowance: i128,
}

impl Delta {
    pub fn total_delta(&self) -> i128 {
        self.ondelta + self.offdelta
    }
}
