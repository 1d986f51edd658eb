//! `xln-node import-replica`: instantiate a new single-signer replica.

use anyhow::Result;
use clap::Args as ClapArgs;
use std::collections::BTreeMap;
use std::sync::Arc;
use xln_runtime::{apply_server_input, Env, ServerTx};
use xln_storage::SnapshotStore;
use xln_types::{ConsensusMode, EntityConfig, EntityId, JurisdictionId, Signer, SignerId};

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// 64-character hex-encoded entity id.
    #[arg(long)]
    entity_id: String,
    /// The signer id hosting this replica.
    #[arg(long)]
    signer_id: String,
    /// Whether this replica is the proposer (single-signer, threshold 1).
    #[arg(long, default_value_t = true)]
    proposer: bool,
    /// The jurisdiction this entity is anchored to.
    #[arg(long, default_value = "local")]
    jurisdiction: String,
}

pub fn run(
    signer: Arc<dyn Signer>,
    snapshot_store: Arc<dyn SnapshotStore>,
    args: Args,
) -> Result<()> {
    let entity_id: EntityId = args.entity_id.parse()?;
    let signer_id = SignerId::new(args.signer_id.clone());
    let config = EntityConfig {
        mode: ConsensusMode::ProposerBased,
        validators: vec![signer_id.clone()],
        threshold: 1,
        shares: BTreeMap::from([(signer_id.clone(), 1)]),
        jurisdiction: JurisdictionId::new(args.jurisdiction),
    };

    let mut env = xln_runtime::replay_latest(signer, snapshot_store)?;
    let now_ms = current_time_ms();
    apply_server_input(
        &mut env,
        vec![ServerTx::ImportReplica {
            entity_id,
            signer_id: signer_id.clone(),
            config,
            is_proposer: args.proposer,
        }],
        vec![],
        now_ms,
    )?;

    tracing::info!(entity = %entity_id, signer = %signer_id, height = env.height, "replica imported");
    Ok(())
}

fn current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
