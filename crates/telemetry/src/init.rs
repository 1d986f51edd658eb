//! Structured logging initialization, keyed off §6's `log_level` option.

use tracing_subscriber::{fmt, EnvFilter};

/// §6's seven recognized `log_level` values. `Silent` has no `tracing`
/// equivalent level, so it maps to a filter that admits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Silent,
}

impl LogLevel {
    fn filter_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            // `tracing` has no FATAL level; the closest admitting filter is ERROR.
            LogLevel::Error | LogLevel::Fatal => "error",
            LogLevel::Silent => "off",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            "SILENT" => Ok(LogLevel::Silent),
            other => Err(format!("unrecognized log_level: {other}")),
        }
    }
}

/// Initializes the global `tracing` subscriber. `RUST_LOG` overrides
/// `level` when set, matching the reference kernel's `init_tracing`.
pub fn init_tracing(level: LogLevel) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    let subscriber = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_every_recognized_level() {
        for (text, expected) in [
            ("TRACE", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("Info", LogLevel::Info),
            ("WARN", LogLevel::Warn),
            ("ERROR", LogLevel::Error),
            ("FATAL", LogLevel::Fatal),
            ("SILENT", LogLevel::Silent),
        ] {
            assert_eq!(LogLevel::from_str(text).unwrap(), expected);
        }
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(LogLevel::from_str("VERBOSE").is_err());
    }
}
