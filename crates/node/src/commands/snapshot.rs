//! `xln-node snapshot show <height>`: inspect a persisted snapshot.

use anyhow::{anyhow, Result};
use clap::Subcommand;
use std::sync::Arc;
use xln_runtime::Snapshot;
use xln_storage::SnapshotStore;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the snapshot at `height` as JSON.
    Show {
        height: u64,
    },
    /// Print the most recently committed height.
    Latest,
}

pub fn run(snapshot_store: Arc<dyn SnapshotStore>, command: Commands) -> Result<()> {
    match command {
        Commands::Show { height } => {
            let blob = snapshot_store
                .get_snapshot(height)?
                .ok_or_else(|| anyhow!("no snapshot stored at height {height}"))?;
            let snapshot = Snapshot::decode_canonical(&blob)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        Commands::Latest => {
            match snapshot_store.latest_height()? {
                Some(height) => println!("{height}"),
                None => println!("no snapshots stored"),
            }
            Ok(())
        }
    }
}
