//! ---
//! cc_section: "02-channel-data-model"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Configuration channel model and validation."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::namespace::{org_namespace, validate_label};
use crate::path::ItemPath;
use crate::{ModelError, Result};

/// File name of the generated state manifest inside every namespace.
pub const MANIFEST_FILE: &str = "init.sls";

/// Organization identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(u64);

impl OrgId {
    /// Wrap a raw organization id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Template engine applied agent-side to a managed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateEngine {
    /// Salt's default Jinja renderer.
    Jinja,
}

impl TemplateEngine {
    /// Name used in state arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateEngine::Jinja => "jinja",
        }
    }
}

/// Owner, group, and permission bits applied on target hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    /// Owning user name.
    #[serde(default)]
    pub user: Option<String>,
    /// Owning group name.
    #[serde(default)]
    pub group: Option<String>,
    /// Octal permission string such as `0644`.
    #[serde(default)]
    pub mode: Option<String>,
}

impl Ownership {
    /// Ownership with user and group set, no explicit mode.
    pub fn owned_by(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            group: Some(group.into()),
            mode: None,
        }
    }

    /// Set the permission mode.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    fn validate(&self, path: &ItemPath) -> Result<()> {
        if let Some(mode) = &self.mode {
            let valid = matches!(mode.len(), 3 | 4)
                && mode.bytes().all(|b| (b'0'..=b'7').contains(&b));
            if !valid {
                return Err(ModelError::InvalidMode {
                    path: path.relative().to_owned(),
                    mode: mode.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Content and rendering hints of a managed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSpec {
    /// Bytes written verbatim into the namespace.
    pub contents: Vec<u8>,
    /// Content is not text; never templated.
    pub binary: bool,
    /// Engine the agent renders the file through, if any.
    pub template: Option<TemplateEngine>,
}

/// What a configuration item manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Regular file whose content ships with the channel.
    File(FileSpec),
    /// Directory created by the agent.
    Directory,
    /// Symbolic link created by the agent.
    Symlink {
        /// Link target as it should appear on the host.
        target: String,
    },
}

impl ItemKind {
    /// Discriminant without payload.
    pub fn tag(&self) -> ItemKindTag {
        match self {
            ItemKind::File(_) => ItemKindTag::File,
            ItemKind::Directory => ItemKindTag::Directory,
            ItemKind::Symlink { .. } => ItemKindTag::Symlink,
        }
    }
}

/// Payload-free item kind, used for state ids and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKindTag {
    /// See [`ItemKind::File`].
    File,
    /// See [`ItemKind::Directory`].
    Directory,
    /// See [`ItemKind::Symlink`].
    Symlink,
}

impl ItemKindTag {
    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKindTag::File => "file",
            ItemKindTag::Directory => "dir",
            ItemKindTag::Symlink => "symlink",
        }
    }
}

/// One managed filesystem object within a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationItem {
    /// Raw path as stored upstream; normalized during validation.
    pub path: String,
    /// Kind-specific payload.
    pub kind: ItemKind,
    /// Ownership metadata.
    pub ownership: Ownership,
}

impl ConfigurationItem {
    /// A managed file with the given contents.
    pub fn file(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            kind: ItemKind::File(FileSpec {
                contents: contents.into(),
                ..FileSpec::default()
            }),
            ownership: Ownership::default(),
        }
    }

    /// A managed directory.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ItemKind::Directory,
            ownership: Ownership::default(),
        }
    }

    /// A managed symlink pointing at `target`.
    pub fn symlink(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ItemKind::Symlink {
                target: target.into(),
            },
            ownership: Ownership::default(),
        }
    }

    /// Attach ownership metadata.
    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = ownership;
        self
    }

    /// Route a file item through a template engine. No effect on other kinds.
    pub fn with_template(mut self, engine: TemplateEngine) -> Self {
        if let ItemKind::File(spec) = &mut self.kind {
            spec.template = Some(engine);
        }
        self
    }

    /// Mark a file item as binary. No effect on other kinds.
    pub fn binary(mut self) -> Self {
        if let ItemKind::File(spec) = &mut self.kind {
            spec.binary = true;
        }
        self
    }

    fn validate(&self) -> Result<ItemPath> {
        let path = ItemPath::parse(&self.path)?;
        if path.relative() == MANIFEST_FILE {
            return Err(ModelError::ReservedPath {
                path: path.relative().to_owned(),
            });
        }
        self.ownership.validate(&path)?;
        match &self.kind {
            ItemKind::File(spec) if spec.binary && spec.template.is_some() => {
                Err(ModelError::BinaryTemplate {
                    path: path.relative().to_owned(),
                })
            }
            ItemKind::Symlink { .. } if self.ownership.mode.is_some() => {
                Err(ModelError::ModeOnSymlink {
                    path: path.relative().to_owned(),
                })
            }
            ItemKind::Symlink { target } if target.is_empty() || target.contains('\0') => {
                Err(ModelError::InvalidTarget {
                    path: path.relative().to_owned(),
                    target: target.clone(),
                })
            }
            _ => Ok(path),
        }
    }
}

/// Named, organization-scoped, ordered collection of configuration items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationChannel {
    /// Upstream identifier; informational only.
    pub id: Option<u64>,
    /// Owning organization.
    pub org_id: OrgId,
    /// Label, unique within the organization.
    pub label: String,
    /// Human-readable name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Items in application order.
    pub items: Vec<ConfigurationItem>,
}

impl ConfigurationChannel {
    /// Empty channel owned by `org_id`.
    pub fn new(org_id: OrgId, label: impl Into<String>) -> Self {
        Self {
            id: None,
            org_id,
            label: label.into(),
            name: None,
            description: None,
            items: Vec::new(),
        }
    }

    /// Append an item, keeping channel order.
    pub fn with_item(mut self, item: ConfigurationItem) -> Self {
        self.items.push(item);
        self
    }

    /// Append an item in place.
    pub fn push(&mut self, item: ConfigurationItem) {
        self.items.push(item);
    }

    /// Channel identity used in logs and errors (`org42/web-config`).
    pub fn identity(&self) -> String {
        format!("{}/{}", org_namespace(self.org_id), self.label)
    }

    /// Run every check the renderer depends on without touching disk.
    pub fn validate(&self) -> Result<ValidatedChannel<'_>> {
        validate_label(&self.label)?;

        let mut seen = HashSet::with_capacity(self.items.len());
        let mut paths = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let path = item.validate()?;
            if !seen.insert(path.clone()) {
                return Err(ModelError::DuplicatePath {
                    path: path.relative().to_owned(),
                });
            }
            paths.push(path);
        }

        let files: HashSet<&str> = self
            .items
            .iter()
            .zip(&paths)
            .filter(|(item, _)| matches!(item.kind, ItemKind::File(_)))
            .map(|(_, path)| path.relative())
            .collect();
        for path in &paths {
            let relative = path.relative();
            let ancestors = relative.match_indices('/').map(|(idx, _)| &relative[..idx]);
            for ancestor in ancestors {
                if files.contains(ancestor) {
                    return Err(ModelError::PathConflict {
                        path: relative.to_owned(),
                        file: ancestor.to_owned(),
                    });
                }
            }
        }

        tracing::trace!(channel = %self.identity(), items = paths.len(), "channel validated");
        Ok(ValidatedChannel {
            channel: self,
            paths,
        })
    }
}

/// A channel whose label and item paths passed validation.
#[derive(Debug)]
pub struct ValidatedChannel<'a> {
    channel: &'a ConfigurationChannel,
    paths: Vec<ItemPath>,
}

impl<'a> ValidatedChannel<'a> {
    /// The underlying channel.
    pub fn channel(&self) -> &'a ConfigurationChannel {
        self.channel
    }

    /// Items paired with their normalized paths, in channel order.
    pub fn entries(&self) -> impl Iterator<Item = (&'a ConfigurationItem, &ItemPath)> + '_ {
        self.channel.items.iter().zip(self.paths.iter())
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the channel has no items.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> ConfigurationChannel {
        ConfigurationChannel::new(OrgId::new(42), "web-config")
    }

    #[test]
    fn valid_channel_pairs_items_with_normalized_paths() {
        let channel = channel()
            .with_item(ConfigurationItem::file("/etc/app.conf", "x"))
            .with_item(ConfigurationItem::directory("var/lib/app"))
            .with_item(ConfigurationItem::symlink("/etc/alias", "/etc/app.conf"));
        let validated = channel.validate().unwrap();
        let paths: Vec<_> = validated
            .entries()
            .map(|(_, path)| path.relative().to_owned())
            .collect();
        assert_eq!(paths, ["etc/app.conf", "var/lib/app", "etc/alias"]);
        assert_eq!(validated.len(), 3);
    }

    #[test]
    fn duplicate_paths_after_normalization_are_rejected() {
        let channel = channel()
            .with_item(ConfigurationItem::file("/etc/app.conf", "a"))
            .with_item(ConfigurationItem::directory("etc/./app.conf"));
        assert!(matches!(
            channel.validate(),
            Err(ModelError::DuplicatePath { path }) if path == "etc/app.conf"
        ));
    }

    #[test]
    fn items_beneath_a_file_are_rejected() {
        let channel = channel()
            .with_item(ConfigurationItem::file("/etc/app", "x"))
            .with_item(ConfigurationItem::symlink("/etc/app/link", "/tmp"));
        assert!(matches!(
            channel.validate(),
            Err(ModelError::PathConflict { file, .. }) if file == "etc/app"
        ));

        let nested_in_dir = self::channel()
            .with_item(ConfigurationItem::directory("/etc/app"))
            .with_item(ConfigurationItem::file("/etc/app/app.conf", "x"));
        assert!(nested_in_dir.validate().is_ok());
    }

    #[test]
    fn manifest_path_is_reserved() {
        let channel = channel().with_item(ConfigurationItem::file("/init.sls", "x"));
        assert!(matches!(
            channel.validate(),
            Err(ModelError::ReservedPath { .. })
        ));
        let nested = ConfigurationChannel::new(OrgId::new(1), "base")
            .with_item(ConfigurationItem::file("/srv/init.sls", "x"));
        assert!(nested.validate().is_ok());
    }

    #[test]
    fn modes_must_be_octal() {
        for mode in ["0644", "755", "4755"] {
            let item = ConfigurationItem::file("a", "x")
                .with_ownership(Ownership::owned_by("root", "root").with_mode(mode));
            assert!(channel().with_item(item).validate().is_ok(), "{mode}");
        }
        for mode in ["0948", "rwx", "12", "012345"] {
            let item = ConfigurationItem::file("a", "x")
                .with_ownership(Ownership::default().with_mode(mode));
            assert!(matches!(
                channel().with_item(item).validate(),
                Err(ModelError::InvalidMode { .. })
            ));
        }
    }

    #[test]
    fn symlinks_reject_modes_and_empty_targets() {
        let with_mode = ConfigurationItem::symlink("a", "b")
            .with_ownership(Ownership::default().with_mode("0777"));
        assert!(matches!(
            channel().with_item(with_mode).validate(),
            Err(ModelError::ModeOnSymlink { .. })
        ));
        let empty = ConfigurationItem::symlink("a", "");
        assert!(matches!(
            channel().with_item(empty).validate(),
            Err(ModelError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn binary_templates_are_rejected() {
        let item = ConfigurationItem::file("a", vec![0u8, 1, 2])
            .binary()
            .with_template(TemplateEngine::Jinja);
        assert!(matches!(
            channel().with_item(item).validate(),
            Err(ModelError::BinaryTemplate { .. })
        ));
    }

    #[test]
    fn bad_label_fails_before_items() {
        let channel = ConfigurationChannel::new(OrgId::new(1), "../x")
            .with_item(ConfigurationItem::file("../escape", "x"));
        assert!(matches!(
            channel.validate(),
            Err(ModelError::InvalidLabel { .. })
        ));
    }

    #[test]
    fn identity_names_org_and_label() {
        assert_eq!(channel().identity(), "org42/web-config");
    }
}
