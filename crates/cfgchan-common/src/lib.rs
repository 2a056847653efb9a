//! ---
//! cc_section: "01-core-functionality"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Shared primitives and utilities for the renderer runtime."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
//! Configuration shared by the cfgchan binaries. The `logging` section is
//! owned by `cfgchan-logging` and re-exported here.

pub mod config;

pub use cfgchan_logging::{LogFormat, LoggingConfig};
pub use config::{absolutize, AppConfig, LoadedAppConfig, MetricsConfig, RenderConfig};
