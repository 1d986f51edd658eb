//! Runtime configuration (§6), loaded from TOML the way the reference
//! kernel's node binary loads its own config.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use xln_telemetry::LogLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawKernelConfig", into = "RawKernelConfig")]
pub struct KernelConfig {
    pub log_level: LogLevel,
    pub tick_interval_ms: u64,
    pub anchor_poll_interval_ms: u64,
    pub max_cascade_iterations: usize,
    pub frame_timestamp_drift_ms: u64,
    pub mempool_cap: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            log_level: LogLevel::Info,
            tick_interval_ms: 100,
            anchor_poll_interval_ms: 1000,
            max_cascade_iterations: xln_types::limits::MAX_CASCADE_ITERATIONS,
            frame_timestamp_drift_ms: xln_types::limits::FRAME_TIMESTAMP_DRIFT_MS,
            mempool_cap: xln_types::limits::MEMPOOL_CAP,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unrecognized log_level: {0}")]
    UnrecognizedLogLevel(String),
    #[error("mempool_cap must be non-zero")]
    ZeroMempoolCap,
    #[error("max_cascade_iterations must be non-zero")]
    ZeroCascadeIterations,
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl KernelConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: KernelConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mempool_cap == 0 {
            return Err(ConfigError::ZeroMempoolCap);
        }
        if self.max_cascade_iterations == 0 {
            return Err(ConfigError::ZeroCascadeIterations);
        }
        Ok(())
    }
}

/// The wire shape of `KernelConfig`: `log_level` is a plain string on
/// disk, translated to/from `LogLevel` at the boundary so the rest of
/// the kernel works with the typed enum.
#[derive(Debug, Serialize, Deserialize)]
struct RawKernelConfig {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_tick_interval_ms")]
    tick_interval_ms: u64,
    #[serde(default = "default_anchor_poll_interval_ms")]
    anchor_poll_interval_ms: u64,
    #[serde(default = "default_max_cascade_iterations")]
    max_cascade_iterations: usize,
    #[serde(default = "default_frame_timestamp_drift_ms")]
    frame_timestamp_drift_ms: u64,
    #[serde(default = "default_mempool_cap")]
    mempool_cap: usize,
}

fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_tick_interval_ms() -> u64 {
    100
}
fn default_anchor_poll_interval_ms() -> u64 {
    1000
}
fn default_max_cascade_iterations() -> usize {
    xln_types::limits::MAX_CASCADE_ITERATIONS
}
fn default_frame_timestamp_drift_ms() -> u64 {
    xln_types::limits::FRAME_TIMESTAMP_DRIFT_MS
}
fn default_mempool_cap() -> usize {
    xln_types::limits::MEMPOOL_CAP
}

impl TryFrom<RawKernelConfig> for KernelConfig {
    type Error = ConfigError;

    fn try_from(raw: RawKernelConfig) -> Result<Self, Self::Error> {
        let log_level = LogLevel::from_str(&raw.log_level)
            .map_err(|_| ConfigError::UnrecognizedLogLevel(raw.log_level.clone()))?;
        let config = KernelConfig {
            log_level,
            tick_interval_ms: raw.tick_interval_ms,
            anchor_poll_interval_ms: raw.anchor_poll_interval_ms,
            max_cascade_iterations: raw.max_cascade_iterations,
            frame_timestamp_drift_ms: raw.frame_timestamp_drift_ms,
            mempool_cap: raw.mempool_cap,
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<KernelConfig> for RawKernelConfig {
    fn from(config: KernelConfig) -> Self {
        let log_level = match config.log_level {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::Silent => "SILENT",
        }
        .to_string();
        RawKernelConfig {
            log_level,
            tick_interval_ms: config.tick_interval_ms,
            anchor_poll_interval_ms: config.anchor_poll_interval_ms,
            max_cascade_iterations: config.max_cascade_iterations,
            frame_timestamp_drift_ms: config.frame_timestamp_drift_ms,
            mempool_cap: config.mempool_cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = KernelConfig::default();
        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.anchor_poll_interval_ms, 1000);
        assert_eq!(config.max_cascade_iterations, 10);
        assert_eq!(config.frame_timestamp_drift_ms, 30_000);
        assert_eq!(config.mempool_cap, 10_000);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = KernelConfig::from_toml_str("log_level = \"DEBUG\"\n").unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.mempool_cap, 10_000);
    }

    #[test]
    fn rejects_unrecognized_log_level() {
        let err = KernelConfig::from_toml_str("log_level = \"VERBOSE\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnrecognizedLogLevel(_)));
    }

    #[test]
    fn rejects_zero_mempool_cap() {
        let err = KernelConfig::from_toml_str("mempool_cap = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroMempoolCap));
    }
}
