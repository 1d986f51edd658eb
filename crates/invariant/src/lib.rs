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
//! The RCPAN invariant (§4.1): `-C_l <= delta <= R + C_r`, made observable
//! as "how much can flow in each direction right now."
//!
//! `derive_delta` is total for well-formed inputs (non-negative collateral,
//! non-negative credit limits) and uses `i128` arithmetic throughout, wide
//! enough to hold any reserve amount this spec's scenarios exercise (up to
//! `1e19`) without risk of overflow (§4.1, Ambient addition in
//! SPEC_FULL.md).

use xln_types::Delta;

/// The directional capacities and credit breakdown derived from one
/// `Delta`, from one side's point of view (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedDelta {
    pub in_collateral: i128,
    pub out_collateral: i128,
    pub in_own_credit: i128,
    pub out_peer_credit: i128,
    pub out_own_credit: i128,
    pub in_peer_credit: i128,
    pub total_capacity: i128,
    pub in_capacity: i128,
    pub out_capacity: i128,
}

fn nn(x: i128) -> i128 {
    x.max(0)
}

/// Derives the directional capacity of a bilateral `Delta`.
///
/// `own_credit_limit`/`peer_credit_limit` are the caller's own and the
/// counterparty's credit limits *before* any perspective swap;
/// `from_counterparty_view` flips the result to the counterparty's point
/// of view, per §4.1: collateral, allowance, and capacity in-/out- pairs
/// swap, and the own/peer credit limits (and the four credit quantities
/// derived from them) swap with them.
pub fn derive_delta(
    delta: &Delta,
    own_credit_limit: i128,
    peer_credit_limit: i128,
    from_counterparty_view: bool,
) -> DerivedDelta {
    let t = delta.total_delta();
    let c = nn(delta.collateral);

    let (mut in_collateral, mut out_collateral) = if t > 0 {
        (nn(c - t), t.min(c))
    } else {
        (c, 0)
    };

    let (own_limit, peer_limit) = if from_counterparty_view {
        (peer_credit_limit, own_credit_limit)
    } else {
        (own_credit_limit, peer_credit_limit)
    };

    let in_own_credit = nn(-t).min(own_limit);
    let out_peer_credit = nn(t - c).min(peer_limit);
    let out_own_credit = own_limit - in_own_credit;
    let in_peer_credit = peer_limit - out_peer_credit;
    let total_capacity = c + own_limit + peer_limit;

    // The peer's reserved allowance gates what flows in; our own reserved
    // allowance gates what flows out. §9 Open Questions: no transaction in
    // this spec mutates either field, so both are 0 in every shipped
    // scenario — this mapping only matters once a future tx wires them up.
    let (mut in_allowance, mut out_allowance) = (delta.right_allowance, delta.left_allowance);

    if from_counterparty_view {
        std::mem::swap(&mut in_collateral, &mut out_collateral);
        std::mem::swap(&mut in_allowance, &mut out_allowance);
    }

    let in_capacity = nn(in_own_credit + in_collateral + in_peer_credit - in_allowance);
    let out_capacity = nn(out_peer_credit + out_collateral + out_own_credit - out_allowance);

    DerivedDelta {
        in_collateral,
        out_collateral,
        in_own_credit,
        out_peer_credit,
        out_own_credit,
        in_peer_credit,
        total_capacity,
        in_capacity,
        out_capacity,
    }
}
