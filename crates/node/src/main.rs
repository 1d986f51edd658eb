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
//! The `xln-node` binary: a `clap`-derived CLI driving the Runtime Kernel
//! (§4.5's ambient CLI addition) — `run`, `import-replica`, and `snapshot
//! show <height>`.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use xln_runtime::KernelConfig;
use xln_storage::RedbSnapshotStore;
use xln_types::{DeterministicSigner, Signer};

#[derive(Parser, Debug)]
#[command(name = "xln-node", version, about = "Entity replication kernel node")]
struct Cli {
    /// Path to a TOML runtime configuration file; defaults apply if absent.
    #[arg(long, env = "XLN_CONFIG", default_value = "xln.toml")]
    config: PathBuf,

    /// Path to the redb snapshot database.
    #[arg(long, env = "XLN_SNAPSHOT_DB", default_value = "./xln-snapshots.redb")]
    snapshot_db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay the latest snapshot (if any) and drive the tick loop.
    Run,
    /// Instantiate a new single-signer replica and persist it.
    ImportReplica(commands::import_replica::Args),
    /// Inspect persisted snapshots.
    Snapshot {
        #[command(subcommand)]
        command: commands::snapshot::Commands,
    },
}

fn load_config(path: &PathBuf) -> Result<KernelConfig> {
    match std::fs::read_to_string(path) {
        Ok(text) => KernelConfig::from_toml_str(&text)
            .with_context(|| format!("invalid runtime config at {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(KernelConfig::default()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    xln_telemetry::init_tracing(config.log_level)?;

    let signer: Arc<dyn Signer> = Arc::new(DeterministicSigner);
    let snapshot_store = Arc::new(
        RedbSnapshotStore::open(&cli.snapshot_db)
            .with_context(|| format!("failed to open snapshot db at {}", cli.snapshot_db.display()))?,
    );

    match cli.command {
        Commands::Run => commands::run::run(signer, snapshot_store, config).await,
        Commands::ImportReplica(args) => commands::import_replica::run(signer, snapshot_store, args),
        Commands::Snapshot { command } => commands::snapshot::run(snapshot_store, command),
    }
}
