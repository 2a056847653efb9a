//! ---
//! cc_section: "04-channel-rendering"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Channel rendering engine and state manifest writer."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
//! Materializes configuration channels as Salt state trees:
//!
//! ```text
//! <root>/<org-namespace>/<channel-label>/
//!     <file items, content written verbatim>
//!     init.sls
//! ```

use std::path::PathBuf;

use cfgchan_model::ModelError;

/// Result alias used throughout the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Error type for rendering and removing channel namespaces.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Channel failed validation; nothing was written.
    #[error("invalid channel {channel}: {source}")]
    Invalid {
        channel: String,
        #[source]
        source: ModelError,
    },
    /// Filesystem access failed.
    #[error("io error rendering channel {channel} at {}: {source}", path.display())]
    Io {
        channel: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// State manifest could not be serialized.
    #[error("failed to serialize state manifest for channel {channel}: {source}")]
    Manifest {
        channel: String,
        #[source]
        source: serde_yaml::Error,
    },
    /// Wrapper for Prometheus metrics registration failures.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub mod locks;
pub mod manifest;
pub mod metrics;
pub mod renderer;

pub use locks::{NamespaceGuard, NamespaceLocks};
pub use manifest::{StateEntry, StateFunction, StateManifest};
pub use metrics::RenderMetrics;
pub use renderer::{ChannelRenderer, RenderResult};
