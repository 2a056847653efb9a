//! ---
//! cc_section: "02-channel-data-model"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Configuration channel model and validation."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
//! Channel definition documents exchanged with upstream systems.
//!
//! ```yaml
//! org_id: 42
//! label: web-config
//! items:
//!   - kind: file
//!     path: /etc/app.conf
//!     content: "listen = 8080"
//!     ownership: { user: root, group: root, mode: "0644" }
//!   - kind: directory
//!     path: /var/lib/app
//!   - kind: symlink
//!     path: /etc/alias
//!     target: /etc/app.conf
//! ```
use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::channel::{
    ConfigurationChannel, ConfigurationItem, FileSpec, ItemKind, OrgId, Ownership, TemplateEngine,
};
use crate::{ModelError, Result};

/// Serialized form of a [`ConfigurationChannel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelDefinition {
    /// Upstream channel identifier.
    #[serde(default)]
    pub id: Option<u64>,
    /// Owning organization.
    pub org_id: u64,
    /// Channel label.
    pub label: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Items in application order.
    #[serde(default)]
    pub items: Vec<ItemDefinition>,
}

/// Serialized form of a [`ConfigurationItem`], tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemDefinition {
    /// Managed file. Exactly one of `content` / `content_base64` must be set.
    File {
        /// Item path.
        path: String,
        /// UTF-8 text content.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Raw content, standard base64 alphabet.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_base64: Option<String>,
        /// Content is not text.
        #[serde(default)]
        binary: bool,
        /// Agent-side template engine.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        template: Option<TemplateEngine>,
        /// Ownership metadata.
        #[serde(default)]
        ownership: Ownership,
    },
    /// Managed directory.
    Directory {
        /// Item path.
        path: String,
        /// Ownership metadata.
        #[serde(default)]
        ownership: Ownership,
    },
    /// Managed symlink.
    Symlink {
        /// Item path.
        path: String,
        /// Link target.
        target: String,
        /// Ownership metadata.
        #[serde(default)]
        ownership: Ownership,
    },
}

impl ChannelDefinition {
    /// Decode a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(text);
        serde_path_to_error::deserialize(deserializer).map_err(|err| ModelError::Definition {
            location: err.path().to_string(),
            message: err.into_inner().to_string(),
        })
    }

    /// Decode a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
            ModelError::Definition {
                location: err.path().to_string(),
                message: err.into_inner().to_string(),
            }
        })
    }

    /// Read a document from disk; `.json` files are JSON, everything else YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        };
        decoded.map_err(|err| match err {
            ModelError::Definition { location, message } => ModelError::Definition {
                location: format!("{} ({})", path.display(), location),
                message,
            },
            other => other,
        })
    }

    /// Convert into the channel model, decoding file contents.
    pub fn into_channel(self) -> Result<ConfigurationChannel> {
        let mut channel = ConfigurationChannel::new(OrgId::new(self.org_id), self.label);
        channel.id = self.id;
        channel.name = self.name;
        channel.description = self.description;
        for (index, item) in self.items.into_iter().enumerate() {
            channel.push(item.into_item(index)?);
        }
        Ok(channel)
    }
}

impl ItemDefinition {
    fn into_item(self, index: usize) -> Result<ConfigurationItem> {
        let item = match self {
            ItemDefinition::File {
                path,
                content,
                content_base64,
                binary,
                template,
                ownership,
            } => {
                let contents = match (content, content_base64) {
                    (Some(text), None) => text.into_bytes(),
                    (None, Some(encoded)) => {
                        BASE64
                            .decode(encoded.trim())
                            .map_err(|err| ModelError::Definition {
                                location: format!("items[{index}].content_base64"),
                                message: err.to_string(),
                            })?
                    }
                    (Some(_), Some(_)) => {
                        return Err(ModelError::Definition {
                            location: format!("items[{index}]"),
                            message: "file sets both content and content_base64".to_owned(),
                        })
                    }
                    (None, None) => {
                        return Err(ModelError::Definition {
                            location: format!("items[{index}]"),
                            message: "file needs content or content_base64".to_owned(),
                        })
                    }
                };
                ConfigurationItem {
                    path,
                    kind: ItemKind::File(FileSpec {
                        contents,
                        binary,
                        template,
                    }),
                    ownership,
                }
            }
            ItemDefinition::Directory { path, ownership } => {
                ConfigurationItem::directory(path).with_ownership(ownership)
            }
            ItemDefinition::Symlink {
                path,
                target,
                ownership,
            } => ConfigurationItem::symlink(path, target).with_ownership(ownership),
        };
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEB_CONFIG: &str = r#"
org_id: 42
label: web-config
name: Web configuration
items:
  - kind: file
    path: /etc/app.conf
    content: aoeuaoeuao
    ownership: { user: root, group: www, mode: "0640" }
  - kind: directory
    path: /var/lib/app
  - kind: symlink
    path: /etc/alias
    target: /etc/app.conf
"#;

    #[test]
    fn yaml_document_converts_in_order() {
        let channel = ChannelDefinition::from_yaml_str(WEB_CONFIG)
            .unwrap()
            .into_channel()
            .unwrap();
        assert_eq!(channel.org_id, OrgId::new(42));
        assert_eq!(channel.label, "web-config");
        assert_eq!(channel.name.as_deref(), Some("Web configuration"));
        assert_eq!(channel.items.len(), 3);
        assert_eq!(
            channel.items[0].kind,
            ItemKind::File(FileSpec {
                contents: b"aoeuaoeuao".to_vec(),
                binary: false,
                template: None,
            })
        );
        assert_eq!(channel.items[0].ownership.mode.as_deref(), Some("0640"));
        assert_eq!(channel.items[1].kind, ItemKind::Directory);
        assert_eq!(
            channel.items[2].kind,
            ItemKind::Symlink {
                target: "/etc/app.conf".to_owned()
            }
        );
    }

    #[test]
    fn json_document_decodes_base64_content() {
        let json = r#"{
            "org_id": 7,
            "label": "blobs",
            "items": [
                {"kind": "file", "path": "/opt/blob.bin", "content_base64": "AAEC/w==", "binary": true}
            ]
        }"#;
        let channel = ChannelDefinition::from_json_str(json)
            .unwrap()
            .into_channel()
            .unwrap();
        match &channel.items[0].kind {
            ItemKind::File(spec) => {
                assert_eq!(spec.contents, vec![0u8, 1, 2, 255]);
                assert!(spec.binary);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_a_definition_error() {
        let yaml = "org_id: 1\nlabel: base\nitems:\n  - kind: socket\n    path: /run/x\n";
        let err = ChannelDefinition::from_yaml_str(yaml).unwrap_err();
        match err {
            ModelError::Definition { location, message } => {
                assert!(location.contains("items"), "{location}");
                assert!(message.contains("socket"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn file_content_must_be_unambiguous() {
        let both = "org_id: 1\nlabel: base\nitems:\n  - kind: file\n    path: a\n    content: x\n    content_base64: eA==\n";
        let neither = "org_id: 1\nlabel: base\nitems:\n  - kind: file\n    path: a\n";
        for yaml in [both, neither] {
            let err = ChannelDefinition::from_yaml_str(yaml)
                .unwrap()
                .into_channel()
                .unwrap_err();
            assert!(matches!(err, ModelError::Definition { ref location, .. } if location == "items[0]"));
        }
    }

    #[test]
    fn invalid_base64_reports_field() {
        let yaml = "org_id: 1\nlabel: base\nitems:\n  - kind: file\n    path: a\n    content_base64: '!!!'\n";
        let err = ChannelDefinition::from_yaml_str(yaml)
            .unwrap()
            .into_channel()
            .unwrap_err();
        assert!(err.to_string().contains("items[0].content_base64"));
    }

    #[test]
    fn load_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("channel.yaml");
        fs::write(&yaml_path, WEB_CONFIG).unwrap();
        assert_eq!(ChannelDefinition::load(&yaml_path).unwrap().items.len(), 3);

        let json_path = dir.path().join("channel.json");
        fs::write(&json_path, r#"{"org_id": 3, "label": "empty"}"#).unwrap();
        let definition = ChannelDefinition::load(&json_path).unwrap();
        assert_eq!(definition.label, "empty");
        assert!(definition.items.is_empty());

        let missing = ChannelDefinition::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ModelError::Io { .. }));
    }
}
