//! ---
//! cc_section: "04-channel-rendering"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Channel rendering engine and state manifest writer."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
//! Salt state manifest (`init.sls`) generation.
//!
//! Each configuration item maps to one state id holding a single state
//! function whose arguments are a list of one-key mappings, the shape Salt's
//! YAML renderer expects:
//!
//! ```yaml
//! mgrconfig_file_/etc/app.conf:
//!   file.managed:
//!   - name: /etc/app.conf
//!   - source: salt://org42/web-config/etc/app.conf
//!   - makedirs: true
//! ```
use cfgchan_model::{ConfigurationItem, ItemKind, ItemPath, Ownership};
use serde_yaml::{Mapping, Value};

const STATE_ID_PREFIX: &str = "mgrconfig";

/// Salt state function applied to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFunction {
    /// `file.managed`
    FileManaged,
    /// `file.directory`
    FileDirectory,
    /// `file.symlink`
    FileSymlink,
}

impl StateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateFunction::FileManaged => "file.managed",
            StateFunction::FileDirectory => "file.directory",
            StateFunction::FileSymlink => "file.symlink",
        }
    }
}

/// One state id with its function and ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEntry {
    id: String,
    function: StateFunction,
    args: Vec<(&'static str, Value)>,
}

impl StateEntry {
    /// Describe how the agent applies `item`.
    ///
    /// `source_root` is the namespace as seen from the Salt file server
    /// (`org42/web-config`); only file entries reference it.
    pub fn for_item(source_root: &str, item: &ConfigurationItem, path: &ItemPath) -> Self {
        let absolute = path.absolute();
        let mut args = vec![("name", Value::String(absolute.clone()))];
        let function = match &item.kind {
            ItemKind::File(spec) => {
                args.push((
                    "source",
                    Value::String(format!("salt://{}/{}", source_root, path.relative())),
                ));
                args.push(("makedirs", Value::Bool(true)));
                if let Some(engine) = spec.template {
                    args.push(("template", Value::String(engine.as_str().to_owned())));
                }
                push_ownership(&mut args, &item.ownership, "mode");
                StateFunction::FileManaged
            }
            ItemKind::Directory => {
                args.push(("makedirs", Value::Bool(true)));
                push_ownership(&mut args, &item.ownership, "dir_mode");
                StateFunction::FileDirectory
            }
            ItemKind::Symlink { target } => {
                args.push(("target", Value::String(target.clone())));
                args.push(("makedirs", Value::Bool(true)));
                push_ownership(&mut args, &item.ownership, "mode");
                StateFunction::FileSymlink
            }
        };

        Self {
            id: format!("{}_{}_{}", STATE_ID_PREFIX, item.kind.tag().as_str(), absolute),
            function,
            args,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn function(&self) -> StateFunction {
        self.function
    }

    /// Look up an argument by name.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    fn to_value(&self) -> Value {
        let args = self
            .args
            .iter()
            .map(|(key, value)| {
                let mut arg = Mapping::new();
                arg.insert(Value::String((*key).to_owned()), value.clone());
                Value::Mapping(arg)
            })
            .collect();
        let mut function = Mapping::new();
        function.insert(
            Value::String(self.function.as_str().to_owned()),
            Value::Sequence(args),
        );
        Value::Mapping(function)
    }
}

// Symlink modes are rejected during validation, so `mode_key` is only reached
// for files and directories when a mode is present.
fn push_ownership(
    args: &mut Vec<(&'static str, Value)>,
    ownership: &Ownership,
    mode_key: &'static str,
) {
    if let Some(user) = &ownership.user {
        args.push(("user", Value::String(user.clone())));
    }
    if let Some(group) = &ownership.group {
        args.push(("group", Value::String(group.clone())));
    }
    if let Some(mode) = &ownership.mode {
        args.push((mode_key, Value::String(mode.clone())));
    }
}

/// Ordered state entries of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct StateManifest {
    channel: String,
    entries: Vec<StateEntry>,
}

impl StateManifest {
    /// Empty manifest for the channel identified as `channel` (`org42/web-config`).
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: StateEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[StateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to the `init.sls` document text.
    ///
    /// Output depends only on the entries, so identical channels produce
    /// byte-identical manifests.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        let mut document = Mapping::new();
        for entry in &self.entries {
            document.insert(Value::String(entry.id.clone()), entry.to_value());
        }
        let body = serde_yaml::to_string(&Value::Mapping(document))?;
        Ok(format!(
            "# Salt state for configuration channel {}.\n# Generated file; local edits are overwritten on the next render.\n{}",
            self.channel, body
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgchan_model::{ConfigurationChannel, OrgId, TemplateEngine};

    fn entry_for(item: ConfigurationItem) -> StateEntry {
        let path = ItemPath::parse(&item.path).unwrap();
        StateEntry::for_item("org42/web-config", &item, &path)
    }

    #[test]
    fn file_entry_points_at_namespace_source() {
        let entry = entry_for(
            ConfigurationItem::file("etc/app.conf", "x")
                .with_ownership(Ownership::owned_by("root", "www").with_mode("0640")),
        );
        assert_eq!(entry.function(), StateFunction::FileManaged);
        assert_eq!(entry.id(), "mgrconfig_file_/etc/app.conf");
        assert_eq!(entry.arg("name"), Some(&Value::from("/etc/app.conf")));
        assert_eq!(
            entry.arg("source"),
            Some(&Value::from("salt://org42/web-config/etc/app.conf"))
        );
        assert_eq!(entry.arg("user"), Some(&Value::from("root")));
        assert_eq!(entry.arg("group"), Some(&Value::from("www")));
        assert_eq!(entry.arg("mode"), Some(&Value::from("0640")));
        assert_eq!(entry.arg("template"), None);
    }

    #[test]
    fn template_engine_is_declared() {
        let entry = entry_for(
            ConfigurationItem::file("etc/motd", "hi").with_template(TemplateEngine::Jinja),
        );
        assert_eq!(entry.arg("template"), Some(&Value::from("jinja")));
    }

    #[test]
    fn directory_entry_uses_dir_mode() {
        let entry = entry_for(
            ConfigurationItem::directory("/var/lib/app")
                .with_ownership(Ownership::default().with_mode("0750")),
        );
        assert_eq!(entry.function(), StateFunction::FileDirectory);
        assert_eq!(entry.arg("dir_mode"), Some(&Value::from("0750")));
        assert_eq!(entry.arg("mode"), None);
        assert_eq!(entry.arg("source"), None);
    }

    #[test]
    fn symlink_entry_carries_target() {
        let entry = entry_for(ConfigurationItem::symlink("/etc/alias", "/etc/app.conf"));
        assert_eq!(entry.function(), StateFunction::FileSymlink);
        assert_eq!(entry.id(), "mgrconfig_symlink_/etc/alias");
        assert_eq!(entry.arg("target"), Some(&Value::from("/etc/app.conf")));
    }

    #[test]
    fn rendered_document_preserves_item_order() {
        let channel = ConfigurationChannel::new(OrgId::new(42), "web-config")
            .with_item(ConfigurationItem::symlink("/z", "/a"))
            .with_item(ConfigurationItem::file("/a", "x"))
            .with_item(ConfigurationItem::directory("/m"));
        let validated = channel.validate().unwrap();
        let mut manifest = StateManifest::new(channel.identity());
        for (item, path) in validated.entries() {
            manifest.push(StateEntry::for_item("org42/web-config", item, path));
        }

        let text = manifest.render().unwrap();
        assert!(text.starts_with("# Salt state for configuration channel org42/web-config."));
        let parsed: Mapping = serde_yaml::from_str(&text).unwrap();
        let ids: Vec<_> = parsed.keys().filter_map(Value::as_str).collect();
        assert_eq!(ids, ["mgrconfig_symlink_/z", "mgrconfig_file_/a", "mgrconfig_dir_/m"]);

        let managed = &parsed["mgrconfig_file_/a"]["file.managed"];
        assert_eq!(managed[0]["name"], Value::from("/a"));
        assert_eq!(managed[2]["makedirs"], Value::from(true));
    }

    #[test]
    fn empty_manifest_is_an_empty_mapping() {
        let text = StateManifest::new("org1/base").render().unwrap();
        let parsed: Mapping = serde_yaml::from_str(&text).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn mode_stays_a_string_after_round_trip() {
        let mut manifest = StateManifest::new("org1/base");
        manifest.push(entry_for(
            ConfigurationItem::file("etc/x", "x")
                .with_ownership(Ownership::default().with_mode("0644")),
        ));
        let parsed: Value = serde_yaml::from_str(&manifest.render().unwrap()).unwrap();
        assert_eq!(
            parsed["mgrconfig_file_/etc/x"]["file.managed"][3]["mode"],
            Value::from("0644")
        );
    }
}
