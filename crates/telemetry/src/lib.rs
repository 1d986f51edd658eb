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
//! Observability for the entity replication layer: structured logging
//! initialization, a small set of Prometheus gauges/counters, and the
//! `/metrics` + `/healthz` HTTP endpoint (§6's `log_level` configuration
//! option), grounded on the reference kernel's `ioi-telemetry` crate.

pub mod http;
pub mod init;
pub mod metrics;

pub use init::{init_tracing, LogLevel};
pub use metrics::KernelMetrics;
