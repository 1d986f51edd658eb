//! Prometheus gauges/counters for the kernel runtime loop, grounded on
//! the reference kernel's `ioi-telemetry` metrics registry.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Counters and gauges the runtime kernel updates every tick and cascade.
pub struct KernelMetrics {
    registry: Registry,
    pub ticks_processed: IntCounter,
    pub frames_committed: IntCounter,
    pub byzantine_faults_detected: IntCounter,
    pub cascade_iterations: IntCounter,
    pub livelock_faults: IntCounter,
    pub mempool_size: IntGauge,
    pub replica_count: IntGauge,
}

impl KernelMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ticks_processed =
            IntCounter::new("xln_ticks_processed_total", "Consensus ticks processed")?;
        let frames_committed =
            IntCounter::new("xln_frames_committed_total", "Entity frames committed")?;
        let byzantine_faults_detected = IntCounter::new(
            "xln_byzantine_faults_detected_total",
            "Equivocating precommits detected",
        )?;
        let cascade_iterations = IntCounter::new(
            "xln_cascade_iterations_total",
            "processUntilEmpty cascade iterations run",
        )?;
        let livelock_faults = IntCounter::new(
            "xln_livelock_faults_total",
            "Cascades aborted for exceeding the iteration bound",
        )?;
        let mempool_size = IntGauge::new(
            "xln_mempool_size",
            "Pending transactions across all replica mempools",
        )?;
        let replica_count = IntGauge::new("xln_replica_count", "Replicas hosted by this node")?;

        registry.register(Box::new(ticks_processed.clone()))?;
        registry.register(Box::new(frames_committed.clone()))?;
        registry.register(Box::new(byzantine_faults_detected.clone()))?;
        registry.register(Box::new(cascade_iterations.clone()))?;
        registry.register(Box::new(livelock_faults.clone()))?;
        registry.register(Box::new(mempool_size.clone()))?;
        registry.register(Box::new(replica_count.clone()))?;

        Ok(Self {
            registry,
            ticks_processed,
            frames_committed,
            byzantine_faults_detected,
            cascade_iterations,
            livelock_faults,
            mempool_size,
            replica_count,
        })
    }

    /// Renders the registry in Prometheus text exposition format.
    pub fn render(&self) -> Result<Vec<u8>, prometheus::Error> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_metric_names() {
        let metrics = KernelMetrics::new().unwrap();
        metrics.ticks_processed.inc();
        let rendered = String::from_utf8(metrics.render().unwrap()).unwrap();
        assert!(rendered.contains("xln_ticks_processed_total"));
    }
}
