//! `xln-node run`: replay the latest snapshot, then drive the tick loop
//! on a single Tokio task (§5's single-threaded-cooperative contract —
//! `tokio::time::interval` only wakes the loop, it never spawns
//! concurrent tick processing).

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use xln_runtime::{process_until_empty, Env, KernelConfig};
use xln_storage::SnapshotStore;
use xln_telemetry::KernelMetrics;
use xln_types::Signer;

const DEFAULT_TELEMETRY_ADDR: &str = "127.0.0.1:9617";

pub async fn run(
    signer: Arc<dyn Signer>,
    snapshot_store: Arc<dyn SnapshotStore>,
    config: KernelConfig,
) -> Result<()> {
    let mut env: Env = xln_runtime::replay_latest(signer, snapshot_store)?;
    tracing::info!(height = env.height, "replayed environment");

    let metrics = Arc::new(KernelMetrics::new()?);
    let telemetry_addr: SocketAddr = DEFAULT_TELEMETRY_ADDR.parse()?;
    let telemetry_metrics = metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = xln_telemetry::http::serve(telemetry_addr, telemetry_metrics).await {
            tracing::warn!(error = %e, "telemetry server exited");
        }
    });

    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now_ms = current_time_ms();
                metrics.ticks_processed.inc();
                metrics.replica_count.set(env.replicas.len() as i64);
                let mempool_size: usize = env.replicas.values().map(|r| r.mempool.len()).sum();
                metrics.mempool_size.set(mempool_size as i64);

                match process_until_empty(&mut env, vec![], vec![], now_ms, config.max_cascade_iterations) {
                    Ok(outputs) => {
                        for output in &outputs {
                            if matches!(output, xln_runtime::KernelOutput::Fault(_)) {
                                metrics.byzantine_faults_detected.inc();
                            }
                        }
                    }
                    Err(fault) => {
                        metrics.livelock_faults.inc();
                        tracing::error!(error = %fault, "consensus livelock detected, aborting tick loop");
                        return Err(fault.into());
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received shutdown signal");
                break;
            }
        }
    }

    Ok(())
}

fn current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
