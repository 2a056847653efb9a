//! ---
//! cc_section: "03-logging"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Structured logging adapters and sinks."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
//! Subscriber installation.
//!
//! Console output always goes to stderr; stdout belongs to command output.
//! JSON records are flattened so the `org` / `channel` / `item` fields
//! carried by [`LogContext`](crate::LogContext) sit at the top level.
use std::io;
use std::path::PathBuf;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "CFGCHAN_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Console record format for [`init_service`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// One flattened JSON object per event.
    #[default]
    StructuredJson,
    /// Multi-line human-readable output.
    Pretty,
}

/// Where and how [`init_service`] writes events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory holding the daily rolling JSON files.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Console format.
    #[serde(default)]
    pub format: LogFormat,
    /// File name prefix; the service name when unset.
    #[serde(default)]
    pub file_prefix: Option<String>,
}

fn default_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            format: LogFormat::default(),
            file_prefix: None,
        }
    }
}

/// Filter from `CFGCHAN_LOG`, then `RUST_LOG`, then `info`.
pub fn env_filter() -> EnvFilter {
    select_filter(
        std::env::var(LOG_ENV).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    )
}

// Blank or unparseable directives fall through to the next source.
fn select_filter(primary: Option<String>, fallback: Option<String>) -> EnvFilter {
    [primary, fallback]
        .into_iter()
        .flatten()
        .filter(|directive| !directive.trim().is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Initialize a stderr subscriber for CLI use and tests. Repeated calls are no-ops.
pub fn init() {
    let _ = Registry::default()
        .with(env_filter())
        .with(fmt::layer().with_writer(io::stderr))
        .try_init();
}

/// Install the service sinks: stderr console in `config.format` plus a daily
/// rolling JSON file `<prefix>.log` under `config.directory`.
///
/// Returns an error only when the log directory cannot be created. If a
/// subscriber is already installed the call leaves it in place.
pub fn init_service(service: &str, config: &LoggingConfig) -> io::Result<()> {
    std::fs::create_dir_all(&config.directory)?;
    let prefix = config.file_prefix.as_deref().unwrap_or(service);
    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::daily(&config.directory, format!("{prefix}.log")));

    let console = match config.format {
        LogFormat::StructuredJson => fmt::layer()
            .with_timer(UtcTime::rfc_3339())
            .json()
            .flatten_event(true)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(io::stderr).boxed(),
    };
    let file = fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .json()
        .flatten_event(true)
        .with_ansi(false)
        .with_writer(file_writer)
        .boxed();

    let installed = Registry::default()
        .with(env_filter())
        .with(console)
        .with(file)
        .try_init()
        .is_ok();
    if installed {
        let _ = FILE_GUARD.set(guard);
        tracing::info!(
            service,
            directory = %config.directory.display(),
            format = ?config.format,
            "service log sinks installed"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_usable_directive_wins() {
        let filter = select_filter(Some("debug".into()), Some("warn".into()));
        assert_eq!(filter.to_string(), "debug");

        let filter = select_filter(None, Some("warn".into()));
        assert_eq!(filter.to_string(), "warn");

        let filter = select_filter(Some("   ".into()), None);
        assert_eq!(filter.to_string(), DEFAULT_DIRECTIVE);
    }

    #[test]
    fn service_init_creates_log_directory() {
        let dir = tempdir().unwrap();
        let config = LoggingConfig {
            directory: dir.path().join("logs"),
            format: LogFormat::Pretty,
            file_prefix: Some("render".to_owned()),
        };
        init_service("cfgchan-test", &config).unwrap();
        assert!(config.directory.is_dir());
    }

    #[test]
    fn config_defaults_to_json() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::StructuredJson);
        assert_eq!(config.file_prefix, None);
    }
}
