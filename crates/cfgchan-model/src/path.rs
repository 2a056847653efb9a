//! ---
//! cc_section: "02-channel-data-model"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Configuration channel model and validation."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ModelError, Result};

/// Channel-relative item path with all traversal hazards removed.
///
/// Segments are joined with `/` regardless of platform; a leading `/` on the
/// input is accepted because managed systems address config files
/// absolutely (`/etc/motd`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemPath {
    relative: String,
}

impl ItemPath {
    /// Normalize and validate a raw item path.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.contains('\0') {
            return Err(ModelError::InvalidPath {
                path: raw.to_owned(),
                reason: "contains a NUL byte",
            });
        }
        if raw.contains('\\') {
            return Err(ModelError::InvalidPath {
                path: raw.to_owned(),
                reason: "contains a backslash",
            });
        }

        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(ModelError::PathTraversal {
                        path: raw.to_owned(),
                    })
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(ModelError::EmptyPath {
                path: raw.to_owned(),
            });
        }

        Ok(Self {
            relative: segments.join("/"),
        })
    }

    /// Path relative to the channel namespace, e.g. `etc/app.conf`.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Path as declared on target hosts, e.g. `/etc/app.conf`.
    pub fn absolute(&self) -> String {
        format!("/{}", self.relative)
    }

    /// Join onto a namespace directory. The result never leaves `base`.
    pub fn under(&self, base: &Path) -> PathBuf {
        self.relative
            .split('/')
            .fold(base.to_path_buf(), |acc, segment| acc.join(segment))
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}
