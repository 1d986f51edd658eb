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
//! The per-tick consensus engine (§4.3): validate, absorb, forward,
//! commit, propose-handle, aggregate, auto-propose — in that order, for
//! one replica given one `EntityInput`.
//!
//! Every step is pure with respect to its inputs: given the same
//! `(replica, config, input)`, `process_tick` produces the same new
//! replica state and the same outputs, which is what the determinism
//! invariant (§8, property 1) requires of the consensus-critical path.

mod hash;
mod validate;

pub use hash::proposal_hash;
pub use validate::validate_input;

use tracing::{debug, info, warn};
use xln_types::error::ByzantineFault;
use xln_types::{
    EntityConfig, EntityId, EntityInput, EntityTx, ProposedFrame, Replica, Signer, SignerId,
};

/// A side effect of one `process_tick` call, routed by the Runtime Kernel
/// to other replicas or to observability (§4.3, §6).
#[derive(Debug, Clone)]
pub enum ConsensusOutput {
    /// Deliver `input` to the replica identified by `(entity_id,
    /// to_signer)`. The Runtime Kernel resolves this to an actual
    /// transport send (§4.4).
    Route {
        entity_id: EntityId,
        to_signer: SignerId,
        input: EntityInput,
    },
    /// An entity-layer output (diagnostic or profile announce) produced
    /// while applying a committed frame.
    Entity(xln_entity::Output),
    /// A consensus-layer diagnostic: empty mempool on propose, large
    /// batch, proposal already pending, etc. (§4.3 tie-breaks).
    Diagnostic(String),
    /// A detected Byzantine fault. The offending input is always dropped
    /// before this is emitted; state is never mutated by it (§7).
    Fault(ByzantineFault),
}

/// The fixed, per-replica context `process_tick` needs beyond the
/// `Replica` and `EntityInput` themselves.
pub struct TickContext<'a> {
    pub entity_id: EntityId,
    pub self_signer: SignerId,
    pub config: &'a EntityConfig,
    pub signer: &'a dyn Signer,
    pub now_ms: u64,
}

/// Runs one tick of the consensus algorithm for `replica` given `input`
/// (§4.3, steps 1-7). Mutates `replica` in place and returns the outputs
/// to route or observe.
pub fn process_tick(ctx: &TickContext<'_>, replica: &mut Replica, input: EntityInput) -> Vec<ConsensusOutput> {
    let mut outputs = Vec::new();

    // Step 1: validate input.
    if let Err(e) = validate_input(ctx.config, &input, replica.mempool.len()) {
        warn!(error = %e, "dropping malformed entity input");
        return outputs;
    }
    if input.is_empty() {
        return outputs;
    }

    // Step 2: absorb transactions.
    if let Some(txs) = &input.entity_txs {
        replica.mempool.extend(txs.iter().cloned());
        if txs.len() > xln_types::limits::LARGE_BATCH_DIAGNOSTIC_THRESHOLD {
            outputs.push(ConsensusOutput::Diagnostic(format!(
                "large batch: {} txs in one input",
                txs.len()
            )));
        }
    }

    // Step 3: forward phase (non-proposers, before commit handling).
    if !replica.is_proposer && !replica.mempool.is_empty() {
        if let Some(proposer) = ctx.config.proposer() {
            let forwarded = std::mem::take(&mut replica.mempool);
            outputs.push(ConsensusOutput::Route {
                entity_id: ctx.entity_id,
                to_signer: proposer.clone(),
                input: EntityInput::mempool_push(ctx.entity_id, proposer.clone(), forwarded),
            });
        }
    }

    // Step 4: commit-notification handling (non-proposer receiver).
    if let (Some(frame), Some(precommits)) = (&input.proposed_frame, &input.precommits) {
        let power = ctx.config.power_of(precommits.keys());
        if ctx.config.has_quorum(power) && replica.proposal.is_none() {
            commit(replica, frame, &mut outputs);
            return outputs;
        }
    }

    // Step 5: proposal handling.
    if let Some(frame) = &input.proposed_frame {
        let conflicting = replica
            .locked_frame
            .as_ref()
            .is_some_and(|locked| locked.height == frame.height && locked.hash != frame.hash);
        if !conflicting {
            if !accept_timestamp(ctx, frame) {
                outputs.push(ConsensusOutput::Diagnostic(format!(
                    "proposal at height {} rejected: timestamp outside drift window",
                    frame.height
                )));
            } else {
                replica.locked_frame = Some(frame.clone());
                let sig = ctx.signer.sign(&ctx.self_signer, &frame.hash);
                let mut precommits = std::collections::BTreeMap::new();
                precommits.insert(ctx.self_signer.clone(), sig);
                match ctx.config.mode {
                    xln_types::ConsensusMode::ProposerBased => {
                        if let Some(proposer) = ctx.config.proposer() {
                            outputs.push(ConsensusOutput::Route {
                                entity_id: ctx.entity_id,
                                to_signer: proposer.clone(),
                                input: EntityInput {
                                    entity_id: ctx.entity_id,
                                    signer_id: proposer.clone(),
                                    entity_txs: None,
                                    proposed_frame: None,
                                    precommits: Some(precommits.clone()),
                                    metadata: None,
                                },
                            });
                        }
                    }
                    xln_types::ConsensusMode::GossipBased => {
                        for validator in &ctx.config.validators {
                            if *validator == ctx.self_signer {
                                continue;
                            }
                            outputs.push(ConsensusOutput::Route {
                                entity_id: ctx.entity_id,
                                to_signer: validator.clone(),
                                input: EntityInput {
                                    entity_id: ctx.entity_id,
                                    signer_id: validator.clone(),
                                    entity_txs: None,
                                    proposed_frame: None,
                                    precommits: Some(precommits.clone()),
                                    metadata: None,
                                },
                            });
                        }
                    }
                }
            }
        }
    }

    // Step 6: precommit aggregation. The proposer aggregates against its
    // own `proposal`; in gossip mode every other validator independently
    // aggregates against the frame it locked in step 5, since nobody is
    // waiting on a commit notification from a single proposer.
    if let Some(precommits) = &input.precommits {
        let aggregation_target: Option<&mut ProposedFrame> =
            match (replica.proposal.is_some(), ctx.config.mode) {
                (true, _) => replica.proposal.as_mut(),
                (false, xln_types::ConsensusMode::GossipBased) => replica.locked_frame.as_mut(),
                _ => None,
            };
        if let Some(proposal) = aggregation_target {
            for (signer, sig) in precommits {
                if let Some(existing) = proposal.signatures.get(signer) {
                    if existing != sig {
                        outputs.push(ConsensusOutput::Fault(ByzantineFault::Equivocation {
                            signer: signer.clone(),
                            height: proposal.height,
                        }));
                        return outputs;
                    }
                    continue;
                }
                proposal.signatures.insert(signer.clone(), sig.clone());
            }

            let power = ctx.config.power_of(proposal.signatures.keys());
            if ctx.config.has_quorum(power) {
                let frame = proposal.clone();
                commit(replica, &frame, &mut outputs);

                if matches!(ctx.config.mode, xln_types::ConsensusMode::ProposerBased) {
                    for validator in &ctx.config.validators {
                        if *validator == ctx.self_signer {
                            continue;
                        }
                        outputs.push(ConsensusOutput::Route {
                            entity_id: ctx.entity_id,
                            to_signer: validator.clone(),
                            input: EntityInput {
                                entity_id: ctx.entity_id,
                                signer_id: validator.clone(),
                                entity_txs: None,
                                proposed_frame: Some(frame.clone()),
                                precommits: Some(frame.signatures.clone()),
                                metadata: None,
                            },
                        });
                    }
                }
                return outputs;
            }
        } else {
            // A precommit arrived for a height this replica has no
            // proposal or lock for (e.g. the proposal broadcast was lost
            // or arrived out of order) — this is not a silent no-op, it's
            // a fault the proposer/locker should have prevented.
            outputs.push(ConsensusOutput::Fault(ByzantineFault::UnknownProposal {
                height: replica.state.height + 1,
            }));
        }
    }

    // Step 7: auto-propose.
    if replica.is_proposer && !replica.mempool.is_empty() && replica.proposal.is_none() {
        if ctx.config.is_single_signer() {
            fast_path_propose(ctx, replica, &mut outputs);
        } else {
            normal_path_propose(ctx, replica, &mut outputs);
        }
    } else if replica.is_proposer && replica.mempool.is_empty() && replica.proposal.is_none() {
        debug!("proposer has empty mempool, skipping auto-propose");
    }

    outputs
}

fn accept_timestamp(ctx: &TickContext<'_>, frame: &ProposedFrame) -> bool {
    let drift = xln_types::limits::FRAME_TIMESTAMP_DRIFT_MS;
    let proposed = frame.new_state.timestamp;
    let local = ctx.now_ms;
    proposed.abs_diff(local) <= drift
}

fn commit(replica: &mut Replica, frame: &ProposedFrame, outputs: &mut Vec<ConsensusOutput>) {
    replica.state = frame.new_state.clone();
    replica.mempool.clear();
    replica.proposal = None;
    replica.locked_frame = None;
    info!(height = frame.height, "committed frame");
    outputs.push(ConsensusOutput::Diagnostic(format!(
        "committed frame at height {}",
        frame.height
    )));
}

fn fast_path_propose(ctx: &TickContext<'_>, replica: &mut Replica, outputs: &mut Vec<ConsensusOutput>) {
    let txs: Vec<EntityTx> = std::mem::take(&mut replica.mempool);
    let height = replica.state.height + 1;
    let (new_state, entity_outputs) =
        xln_entity::apply_entity_frame(ctx.entity_id, &replica.state, &txs, height, ctx.now_ms);
    replica.state = new_state;
    for out in entity_outputs {
        outputs.push(ConsensusOutput::Entity(out));
    }
    debug!(height, "single-signer fast path committed");
}

fn normal_path_propose(ctx: &TickContext<'_>, replica: &mut Replica, outputs: &mut Vec<ConsensusOutput>) {
    let txs = replica.mempool.clone();
    let height = replica.state.height + 1;
    let (new_state, entity_outputs) =
        xln_entity::apply_entity_frame(ctx.entity_id, &replica.state, &txs, height, ctx.now_ms);
    for out in entity_outputs {
        outputs.push(ConsensusOutput::Entity(out));
    }

    let hash = proposal_hash(height, ctx.now_ms, &txs);
    let sig = ctx.signer.sign(&ctx.self_signer, &hash);
    let mut signatures = std::collections::BTreeMap::new();
    signatures.insert(ctx.self_signer.clone(), sig);

    let frame = ProposedFrame {
        height,
        txs,
        hash,
        new_state,
        signatures,
    };
    replica.proposal = Some(frame.clone());
    replica.locked_frame = Some(frame.clone());

    for validator in &ctx.config.validators {
        if *validator == ctx.self_signer {
            continue;
        }
        outputs.push(ConsensusOutput::Route {
            entity_id: ctx.entity_id,
            to_signer: validator.clone(),
            input: EntityInput {
                entity_id: ctx.entity_id,
                signer_id: validator.clone(),
                entity_txs: None,
                proposed_frame: Some(frame.clone()),
                precommits: None,
                metadata: None,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use xln_types::{ConsensusMode, EntityState, JurisdictionId};

    fn three_signer_config() -> EntityConfig {
        let alice = SignerId::new("alice");
        let bob = SignerId::new("bob");
        let carol = SignerId::new("carol");
        EntityConfig {
            mode: ConsensusMode::ProposerBased,
            validators: vec![alice.clone(), bob.clone(), carol.clone()],
            threshold: 2,
            shares: BTreeMap::from([(alice, 1), (bob, 1), (carol, 1)]),
            jurisdiction: JurisdictionId::new("local"),
        }
    }

    fn entity_id() -> EntityId {
        EntityId::from_bytes([7u8; 32])
    }

    fn replica_for(config: &EntityConfig, is_proposer: bool) -> Replica {
        Replica::new(EntityState::genesis(config.clone()), is_proposer)
    }

    /// Scenario B: a multi-signer proposer-based entity commits once
    /// precommits from a quorum (not all) of its validators arrive.
    #[test]
    fn scenario_b_quorum_precommit_commits_without_unanimity() {
        let config = three_signer_config();
        let signer = xln_types::DeterministicSigner;
        let eid = entity_id();
        let alice = config.validators[0].clone();
        let bob = config.validators[1].clone();

        let mut proposer = replica_for(&config, true);
        let ctx = TickContext {
            entity_id: eid,
            self_signer: alice.clone(),
            config: &config,
            signer: &signer,
            now_ms: 1_000,
        };

        let propose_outputs = process_tick(
            &ctx,
            &mut proposer,
            EntityInput::mempool_push(eid, alice.clone(), vec![EntityTx::Chat {
                from: alice.clone(),
                message: "hello".into(),
            }]),
        );
        assert!(proposer.proposal.is_some(), "proposer should hold a pending proposal");
        assert!(propose_outputs
            .iter()
            .any(|o| matches!(o, ConsensusOutput::Route { to_signer, .. } if *to_signer == bob)));

        let frame = proposer.proposal.clone().unwrap_or_else(|| unreachable!());
        let bob_sig = signer.sign(&bob, &frame.hash);
        let mut precommits = BTreeMap::new();
        precommits.insert(bob.clone(), bob_sig);

        let commit_outputs = process_tick(
            &ctx,
            &mut proposer,
            EntityInput {
                entity_id: eid,
                signer_id: bob.clone(),
                entity_txs: None,
                proposed_frame: None,
                precommits: Some(precommits),
                metadata: None,
            },
        );

        assert_eq!(proposer.state.height, 1, "quorum of 2-of-3 shares must commit");
        assert!(proposer.proposal.is_none());
        assert!(commit_outputs
            .iter()
            .any(|o| matches!(o, ConsensusOutput::Diagnostic(d) if d.contains("committed"))));
    }

    /// Scenario C: two distinct signatures from the same signer over the
    /// same proposal height are an equivocation, not a merge.
    #[test]
    fn scenario_c_double_sign_is_rejected_as_byzantine_fault() {
        let mut config = three_signer_config();
        config.threshold = 3; // require unanimity so the second precommit is
                              // processed before quorum would otherwise commit.
        let signer = xln_types::DeterministicSigner;
        let eid = entity_id();
        let alice = config.validators[0].clone();
        let bob = config.validators[1].clone();

        let mut proposer = replica_for(&config, true);
        let ctx = TickContext {
            entity_id: eid,
            self_signer: alice.clone(),
            config: &config,
            signer: &signer,
            now_ms: 1_000,
        };

        process_tick(
            &ctx,
            &mut proposer,
            EntityInput::mempool_push(eid, alice.clone(), vec![EntityTx::Chat {
                from: alice.clone(),
                message: "hello".into(),
            }]),
        );
        let frame = proposer.proposal.clone().unwrap_or_else(|| unreachable!());

        let genuine_sig = signer.sign(&bob, &frame.hash);
        let mut first = BTreeMap::new();
        first.insert(bob.clone(), genuine_sig);
        process_tick(
            &ctx,
            &mut proposer,
            EntityInput {
                entity_id: eid,
                signer_id: bob.clone(),
                entity_txs: None,
                proposed_frame: None,
                precommits: Some(first),
                metadata: None,
            },
        );

        let forged_sig = xln_types::Signature(b"not-the-real-signature".to_vec());
        let mut second = BTreeMap::new();
        second.insert(bob.clone(), forged_sig);
        let outputs = process_tick(
            &ctx,
            &mut proposer,
            EntityInput {
                entity_id: eid,
                signer_id: bob.clone(),
                entity_txs: None,
                proposed_frame: None,
                precommits: Some(second),
                metadata: None,
            },
        );

        assert!(outputs
            .iter()
            .any(|o| matches!(o, ConsensusOutput::Fault(ByzantineFault::Equivocation { signer, .. }) if *signer == bob)));
        assert_eq!(proposer.state.height, 0, "equivocating precommit must not commit the frame");
    }
}
