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
//! The Runtime Kernel (C5): `applyServerInput`/`processUntilEmpty`,
//! snapshot persistence, replay, and anchor-event ingestion (§4.5).
//!
//! `Env` owns every replica, the server-transaction log, and the channel
//! fabric; the Consensus Engine only ever receives a mutable reference to
//! one replica per call (§5's shared-resource policy). Nothing here
//! reaches for `SystemTime::now()` — callers (tests, `xln-node`) pass
//! `now_ms` explicitly, keeping the kernel a pure function of its inputs.

pub mod anchor;
pub mod config;
mod merge;
pub mod snapshot;

pub use config::{ConfigError, KernelConfig};
pub use merge::merge_inputs;
pub use snapshot::{ReplicaSnapshot, Snapshot};

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use xln_channel::{ChannelTransport, InMemoryTransport};
use xln_consensus::{process_tick, ConsensusOutput, TickContext};
use xln_entity::Output as EntityOutput;
use xln_types::error::{ByzantineFault, ConsensusLivelockFault, ValidationError};
use xln_types::{EntityConfig, EntityId, EntityInput, EntityState, Replica, Signer, SignerId};
use xln_storage::SnapshotStore;

/// The only `serverTx` the reference behavior defines (§4.5 step 4):
/// instantiate a new replica with zeroed state and register it with the
/// Channel Fabric.
#[derive(Debug, Clone, PartialEq, Eq, parity_scale_codec::Encode, parity_scale_codec::Decode, serde::Serialize, serde::Deserialize)]
pub enum ServerTx {
    ImportReplica {
        entity_id: EntityId,
        signer_id: SignerId,
        config: EntityConfig,
        is_proposer: bool,
    },
}

/// A `SignerId` value meaning "any replica of this entity will do",
/// honored when addressing a merged input (§4.5 step 6).
pub const SYSTEM_SIGNER: &str = "system";

/// An observable effect of one `apply_server_input` call. `Route` is the
/// only variant `process_until_empty` feeds back as a next-round input;
/// the rest are purely for logging/metrics.
#[derive(Debug, Clone)]
pub enum KernelOutput {
    Route(EntityInput),
    Entity(EntityOutput),
    Diagnostic(String),
    Fault(ByzantineFault),
}

/// Everything the Runtime Kernel owns (§5's shared-resource policy):
/// replicas, the server-input log, and the bilateral channel fabric.
pub struct Env {
    pub height: u64,
    pub timestamp: u64,
    pub replicas: BTreeMap<(EntityId, SignerId), Replica>,
    pub server_input: Vec<ServerTx>,
    pub channels: InMemoryTransport,
    pub signer: Arc<dyn Signer>,
    pub snapshot_store: Arc<dyn SnapshotStore>,
}

impl Env {
    pub fn new(signer: Arc<dyn Signer>, snapshot_store: Arc<dyn SnapshotStore>) -> Self {
        Env {
            height: 0,
            timestamp: 0,
            replicas: BTreeMap::new(),
            server_input: Vec::new(),
            channels: InMemoryTransport::new(),
            signer,
            snapshot_store,
        }
    }

    fn resolve_replica_key(&self, entity_id: EntityId, signer_id: &SignerId) -> Option<(EntityId, SignerId)> {
        if signer_id.0 == SYSTEM_SIGNER {
            self.replicas
                .range((entity_id, SignerId::new(""))..)
                .take_while(|((e, _), _)| *e == entity_id)
                .map(|(k, _)| k.clone())
                .next()
        } else {
            let key = (entity_id, signer_id.clone());
            self.replicas.contains_key(&key).then_some(key)
        }
    }

    fn drain_channel_inputs(&mut self) -> Vec<EntityInput> {
        let recipients: Vec<EntityId> = self
            .replicas
            .keys()
            .map(|(entity_id, _)| *entity_id)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut inputs = Vec::new();
        for entity_id in recipients {
            for message in self.channels.get_pending(entity_id) {
                inputs.push(EntityInput {
                    entity_id: message.to_entity_id,
                    signer_id: message.signer_id,
                    entity_txs: Some(message.entity_txs),
                    proposed_frame: None,
                    precommits: None,
                    metadata: Some(message.message_id.into_bytes()),
                });
            }
        }
        inputs
    }
}

fn validate_batch(
    server_txs: &[ServerTx],
    entity_inputs: &[EntityInput],
) -> Result<(), ValidationError> {
    if server_txs.len() > xln_types::limits::MAX_SERVER_TXS_PER_TICK {
        return Err(ValidationError::TooManyTxs {
            got: server_txs.len(),
            bound: xln_types::limits::MAX_SERVER_TXS_PER_TICK,
        });
    }
    if entity_inputs.len() > xln_types::limits::MAX_ENTITY_INPUTS_PER_TICK {
        return Err(ValidationError::TooManyTxs {
            got: entity_inputs.len(),
            bound: xln_types::limits::MAX_ENTITY_INPUTS_PER_TICK,
        });
    }
    Ok(())
}

/// Runs one kernel tick (§4.5 steps 1-8). Returns the outputs produced and
/// the merged inputs actually applied.
pub fn apply_server_input(
    env: &mut Env,
    server_txs: Vec<ServerTx>,
    entity_inputs: Vec<EntityInput>,
    now_ms: u64,
) -> Result<(Vec<KernelOutput>, Vec<EntityInput>), ValidationError> {
    validate_batch(&server_txs, &entity_inputs)?;

    env.server_input.extend(server_txs.iter().cloned());

    let mut merged = merge_inputs(entity_inputs);

    for tx in &server_txs {
        let ServerTx::ImportReplica {
            entity_id,
            signer_id,
            config,
            is_proposer,
        } = tx;
        let key = (*entity_id, signer_id.clone());
        env.replicas
            .entry(key)
            .or_insert_with(|| Replica::new(EntityState::genesis(config.clone()), *is_proposer));
        env.channels.register(*entity_id);
        info!(entity = %entity_id, signer = %signer_id, "imported replica");
    }

    merged.extend(merge_inputs(env.drain_channel_inputs()));

    let mut outputs = Vec::new();
    for input in &merged {
        let Some(key) = env.resolve_replica_key(input.entity_id, &input.signer_id) else {
            warn!(entity = %input.entity_id, signer = %input.signer_id, "input addressed an unknown replica");
            outputs.push(KernelOutput::Diagnostic(format!(
                "dropped input for unknown replica {}/{}",
                input.entity_id, input.signer_id
            )));
            continue;
        };
        let (entity_id, self_signer) = key.clone();
        let config = env.replicas[&key].state.config.clone();
        let Some(replica) = env.replicas.get_mut(&key) else {
            continue;
        };
        let ctx = TickContext {
            entity_id,
            self_signer,
            config: &config,
            signer: env.signer.as_ref(),
            now_ms,
        };
        for out in process_tick(&ctx, replica, input.clone()) {
            outputs.push(match out {
                ConsensusOutput::Route {
                    entity_id,
                    to_signer,
                    mut input,
                } => {
                    // `process_tick` already addresses `input` to
                    // `to_signer` (its `signer_id` field), but route
                    // delivery is keyed on `to_signer` explicitly rather
                    // than trusting the payload, since a misrouted input
                    // must not silently deliver to the wrong replica.
                    input.entity_id = entity_id;
                    input.signer_id = to_signer;
                    KernelOutput::Route(input)
                }
                ConsensusOutput::Entity(e) => KernelOutput::Entity(e),
                ConsensusOutput::Diagnostic(d) => KernelOutput::Diagnostic(d),
                ConsensusOutput::Fault(f) => KernelOutput::Fault(f),
            });
        }
    }

    let meaningful = !server_txs.is_empty() || !merged.is_empty() || !outputs.is_empty();
    if meaningful {
        env.height += 1;
        env.timestamp = now_ms;
        persist_snapshot(env, &outputs)?;
    }

    Ok((outputs, merged))
}

fn persist_snapshot(env: &Env, outputs: &[KernelOutput]) -> Result<(), ValidationError> {
    let snapshot = Snapshot {
        height: env.height,
        timestamp: env.timestamp,
        replicas: env
            .replicas
            .iter()
            .map(|(k, v)| (k.clone(), ReplicaSnapshot::from(v)))
            .collect(),
        server_input: env.server_input.clone(),
        server_outputs: outputs.iter().map(|o| format!("{o:?}")).collect(),
        description: format!("kernel frame at height {}", env.height),
    };
    let blob = snapshot.encode_canonical();
    if let Err(e) = env.snapshot_store.put_snapshot(env.height, &blob) {
        warn!(error = %e, "snapshot write failed, will retry on next meaningful tick");
        return Ok(());
    }
    if let Err(e) = env.snapshot_store.set_latest_height(env.height) {
        warn!(error = %e, "failed to advance latest_height marker");
    }
    Ok(())
}

/// Feeds `Route` outputs back as the next round's inputs, up to `bound`
/// iterations (§4.5's cascade, §5's liveness bound, default 10). A
/// non-empty `Route` queue at the bound is `ConsensusLivelockFault`: a
/// consensus-logic infinite loop that must not be silently dropped.
pub fn process_until_empty(
    env: &mut Env,
    server_txs: Vec<ServerTx>,
    entity_inputs: Vec<EntityInput>,
    now_ms: u64,
    bound: usize,
) -> Result<Vec<KernelOutput>, ConsensusLivelockFault> {
    let mut all_outputs = Vec::new();
    let mut pending_server_txs = server_txs;
    let mut pending_inputs = entity_inputs;

    for iteration in 0..bound {
        let (outputs, _merged) =
            apply_server_input(env, std::mem::take(&mut pending_server_txs), pending_inputs, now_ms)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "dropping malformed batch in cascade");
                    (Vec::new(), Vec::new())
                });

        pending_inputs = Vec::new();
        for output in outputs {
            match output {
                KernelOutput::Route(input) => pending_inputs.push(input),
                other => all_outputs.push(other),
            }
        }

        if pending_inputs.is_empty() {
            return Ok(all_outputs);
        }

        if iteration + 1 == bound {
            warn!(bound, "processUntilEmpty exceeded its iteration bound with outputs remaining");
            return Err(ConsensusLivelockFault::IterationBoundExceeded { bound });
        }
    }

    Ok(all_outputs)
}

/// Replays the most recent snapshot into a fresh `Env` on startup (§4.5).
/// Snapshot 0 is implicit empty state; absent any stored snapshot the
/// returned `Env` is exactly what `Env::new` produces.
pub fn replay_latest(
    signer: Arc<dyn Signer>,
    snapshot_store: Arc<dyn SnapshotStore>,
) -> Result<Env, xln_types::error::StateError> {
    let mut env = Env::new(signer, snapshot_store.clone());
    let Some(height) = snapshot_store.latest_height()? else {
        return Ok(env);
    };
    let Some(blob) = snapshot_store.get_snapshot(height)? else {
        return Ok(env);
    };
    let snapshot = Snapshot::decode_canonical(&blob)?;
    env.height = snapshot.height;
    env.timestamp = snapshot.timestamp;
    env.server_input = snapshot.server_input;
    for (key, replica_snapshot) in snapshot.replicas {
        env.channels.register(key.0);
        env.replicas.insert(key, Replica::from(replica_snapshot));
    }
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use xln_storage::InMemorySnapshotStore;
    use xln_types::{ConsensusMode, DeterministicSigner, EntityTx};

    fn entity(byte: u8) -> EntityId {
        EntityId::from_bytes([byte; 32])
    }

    fn single_signer_config(signer: &str) -> EntityConfig {
        EntityConfig {
            mode: ConsensusMode::ProposerBased,
            validators: vec![SignerId::new(signer)],
            threshold: 1,
            shares: BTreeMap::from([(SignerId::new(signer), 1)]),
            jurisdiction: xln_types::JurisdictionId::new("test"),
        }
    }

    fn new_env() -> Env {
        Env::new(
            Arc::new(DeterministicSigner),
            Arc::new(InMemorySnapshotStore::new()),
        )
    }

    #[test]
    fn scenario_a_single_signer_fast_path() {
        let mut env = new_env();
        let e1 = entity(1);
        let import = ServerTx::ImportReplica {
            entity_id: e1,
            signer_id: SignerId::new("s1"),
            config: single_signer_config("s1"),
            is_proposer: true,
        };
        let (_outputs, _merged) = apply_server_input(&mut env, vec![import], vec![], 1000).unwrap();

        let chat = EntityInput::mempool_push(
            e1,
            SignerId::new("s1"),
            vec![EntityTx::Chat {
                from: SignerId::new("s1"),
                message: "hello".to_string(),
            }],
        );
        let (outputs, _merged) = apply_server_input(&mut env, vec![], vec![chat], 1001).unwrap();

        let replica = &env.replicas[&(e1, SignerId::new("s1"))];
        assert_eq!(replica.state.height, 1);
        assert_eq!(replica.state.messages, vec!["hello".to_string()]);
        assert!(!outputs
            .iter()
            .any(|o| matches!(o, KernelOutput::Route(_))));
    }

    #[test]
    fn import_replica_registers_with_channel_fabric() {
        let mut env = new_env();
        let e1 = entity(1);
        let import = ServerTx::ImportReplica {
            entity_id: e1,
            signer_id: SignerId::new("s1"),
            config: single_signer_config("s1"),
            is_proposer: true,
        };
        apply_server_input(&mut env, vec![import], vec![], 1000).unwrap();
        assert_eq!(env.channels.get_pending(e1).len(), 0);
    }

    #[test]
    fn empty_tick_produces_no_height_bump() {
        let mut env = new_env();
        let (outputs, merged) = apply_server_input(&mut env, vec![], vec![], 1000).unwrap();
        assert!(outputs.is_empty());
        assert!(merged.is_empty());
        assert_eq!(env.height, 0);
    }

    #[test]
    fn scenario_f_cascade_bound_is_a_livelock_fault() {
        let mut env = new_env();
        let e1 = entity(1);
        let s1 = SignerId::new("s1");
        apply_server_input(
            &mut env,
            vec![ServerTx::ImportReplica {
                entity_id: e1,
                signer_id: s1.clone(),
                config: single_signer_config("s1"),
                is_proposer: false,
            }],
            vec![],
            1000,
        )
        .unwrap();

        // A non-proposer with a nonempty mempool and a proposer pointing
        // back at itself forwards forever: config names `s1` as the sole
        // validator yet the replica is marked non-proposer, so step 3
        // (forward phase) re-routes to itself on every iteration.
        let push = EntityInput::mempool_push(
            e1,
            s1.clone(),
            vec![EntityTx::Chat {
                from: s1,
                message: "loop".to_string(),
            }],
        );
        let result = process_until_empty(&mut env, vec![], vec![push], 1000, 10);
        assert!(matches!(
            result,
            Err(ConsensusLivelockFault::IterationBoundExceeded { bound: 10 })
        ));
    }

    #[test]
    fn scenario_e_reserve_transfer_via_j_event_is_idempotent() {
        let mut env = new_env();
        let e1 = entity(1);
        let e2 = entity(2);
        apply_server_input(
            &mut env,
            vec![
                ServerTx::ImportReplica {
                    entity_id: e1,
                    signer_id: SignerId::new("s1"),
                    config: single_signer_config("s1"),
                    is_proposer: true,
                },
                ServerTx::ImportReplica {
                    entity_id: e2,
                    signer_id: SignerId::new("s2"),
                    config: single_signer_config("s2"),
                    is_proposer: true,
                },
            ],
            vec![],
            1000,
        )
        .unwrap();

        let mut proposers = BTreeMap::new();
        proposers.insert(e1, SignerId::new("s1"));
        proposers.insert(e2, SignerId::new("s2"));

        let make_inputs = |balance_e1: i128, balance_e2: i128| {
            let mut inputs = crate::anchor::build_j_event_inputs(
                1,
                [1u8; 32],
                0,
                xln_types::AnchorEvent::ReserveUpdated {
                    entity: e1,
                    token_id: xln_types::TokenId(1),
                    new_balance: balance_e1,
                },
                |id| proposers.get(&id).cloned(),
            );
            inputs.extend(crate::anchor::build_j_event_inputs(
                1,
                [2u8; 32],
                0,
                xln_types::AnchorEvent::ReserveUpdated {
                    entity: e2,
                    token_id: xln_types::TokenId(1),
                    new_balance: balance_e2,
                },
                |id| proposers.get(&id).cloned(),
            ));
            inputs
        };

        let first_round = make_inputs(10_000_000_000_000_000_000, 1_000_000_000_000_000_000);
        process_until_empty(&mut env, vec![], first_round, 1001, 10).unwrap();

        let second_round = make_inputs(10_000_000_000_000_000_000, 1_000_000_000_000_000_000);
        process_until_empty(&mut env, vec![], second_round, 1002, 10).unwrap();

        let r1 = &env.replicas[&(e1, SignerId::new("s1"))];
        let r2 = &env.replicas[&(e2, SignerId::new("s2"))];
        assert_eq!(
            r1.state.reserves[&xln_types::TokenId(1)].amount,
            10_000_000_000_000_000_000
        );
        assert_eq!(
            r2.state.reserves[&xln_types::TokenId(1)].amount,
            1_000_000_000_000_000_000
        );
    }
}
