//! ---
//! cc_section: "02-channel-data-model"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Configuration channel model and validation."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
use crate::channel::OrgId;
use crate::{ModelError, Result};

/// Prefix of every organization namespace directory.
pub const ORG_NAMESPACE_PREFIX: &str = "org";

/// Filesystem segment owning all channels of an organization (`org42`).
///
/// Ids are rendered in canonical decimal under a fixed prefix, so distinct
/// ids never share a segment.
pub fn org_namespace(org_id: OrgId) -> String {
    format!("{ORG_NAMESPACE_PREFIX}{}", org_id.get())
}

/// Dotted Salt state name a rendered channel is applied under (`org42.web-config`).
pub fn state_name(org_id: OrgId, label: &str) -> String {
    format!("{}.{}", org_namespace(org_id), label)
}

/// Check that a channel label can be used as one directory name.
pub fn validate_label(label: &str) -> Result<()> {
    let reason = if label.is_empty() {
        Some("label is empty")
    } else if label == "." || label == ".." {
        Some("label is a relative path component")
    } else if label.contains('/') || label.contains('\\') {
        Some("label contains a path separator")
    } else if label.contains('\0') {
        Some("label contains a NUL byte")
    } else if label.contains('.') {
        // Salt resolves `a.b` as the state file `a/b`; a dot would split the label.
        Some("label contains a dot")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ModelError::InvalidLabel {
            label: label.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}
