//! ---
//! cc_section: "02-channel-data-model"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Configuration channel model and validation."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
//! Read-only view of configuration channels as handed over by the
//! persistence layer, plus the validation the renderer relies on before it
//! touches the filesystem.
#![warn(missing_docs)]

use std::path::PathBuf;

/// Result alias used throughout the model crate.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Error type for channel validation and definition decoding.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Channel label is not usable as a single path segment.
    #[error("invalid channel label {label:?}: {reason}")]
    InvalidLabel {
        /// Offending label.
        label: String,
        /// Why the label was rejected.
        reason: &'static str,
    },
    /// Item path is empty once separators and `.` segments are removed.
    #[error("item path {path:?} is empty")]
    EmptyPath {
        /// Raw path as supplied.
        path: String,
    },
    /// Item path would escape the channel namespace.
    #[error("item path {path:?} escapes the channel root")]
    PathTraversal {
        /// Raw path as supplied.
        path: String,
    },
    /// Item path contains characters the filesystem cannot represent.
    #[error("item path {path:?} is invalid: {reason}")]
    InvalidPath {
        /// Raw path as supplied.
        path: String,
        /// Why the path was rejected.
        reason: &'static str,
    },
    /// Item path collides with the generated state manifest.
    #[error("item path {path:?} is reserved for the state manifest")]
    ReservedPath {
        /// Normalized path.
        path: String,
    },
    /// Two items in one channel resolve to the same path.
    #[error("item path {path:?} appears more than once in the channel")]
    DuplicatePath {
        /// Normalized path.
        path: String,
    },
    /// A file item sits where another item needs a directory.
    #[error("item path {path:?} lies beneath file item {file:?}")]
    PathConflict {
        /// Normalized path of the nested item.
        path: String,
        /// Normalized path of the file item.
        file: String,
    },
    /// Permission mode is not an octal string of three or four digits.
    #[error("item {path:?} has invalid mode {mode:?}")]
    InvalidMode {
        /// Normalized path.
        path: String,
        /// Offending mode.
        mode: String,
    },
    /// Symlinks carry no permission bits of their own.
    #[error("symlink {path:?} cannot declare a mode")]
    ModeOnSymlink {
        /// Normalized path.
        path: String,
    },
    /// Binary files are never passed through a template engine.
    #[error("binary file {path:?} cannot use a template engine")]
    BinaryTemplate {
        /// Normalized path.
        path: String,
    },
    /// Symlink target is empty or contains NUL bytes.
    #[error("symlink {path:?} has invalid target {target:?}")]
    InvalidTarget {
        /// Normalized path.
        path: String,
        /// Offending target.
        target: String,
    },
    /// A channel definition document could not be decoded.
    #[error("invalid channel definition at {location}: {message}")]
    Definition {
        /// Field path (e.g. `items[2].kind`) or source file.
        location: String,
        /// Decoder message.
        message: String,
    },
    /// Reading a definition document failed.
    #[error("unable to read channel definition {path}: {source}")]
    Io {
        /// Document path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

pub mod channel;
pub mod definition;
pub mod namespace;
pub mod path;

pub use channel::{
    ConfigurationChannel, ConfigurationItem, FileSpec, ItemKind, ItemKindTag, OrgId, Ownership,
    TemplateEngine, ValidatedChannel, MANIFEST_FILE,
};
pub use definition::{ChannelDefinition, ItemDefinition};
pub use namespace::{org_namespace, state_name, validate_label, ORG_NAMESPACE_PREFIX};
pub use path::ItemPath;
