//! ---
//! cc_section: "01-core-functionality"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Shared primitives and utilities for the renderer runtime."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use cfgchan_logging::LoggingConfig;
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Salt file root the renderer writes channel namespaces into.
pub const DEFAULT_SALT_ROOT: &str = "/srv/susemanager/salt";

fn default_salt_root() -> PathBuf {
    PathBuf::from(DEFAULT_SALT_ROOT)
}

fn default_metrics_enabled() -> bool {
    true
}

/// Primary configuration object for cfgchan tooling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and built-in defaults are in effect.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "CFGCHAN_CONFIG";

    /// Well-known locations inspected when no explicit path is given.
    pub const DEFAULT_CANDIDATES: [&'static str; 2] = ["/etc/cfgchan/cfgchan.toml", "cfgchan.toml"];

    /// Load configuration together with the effective source path.
    ///
    /// Falls back to [`AppConfig::default`] when neither the environment override
    /// nor any candidate exists.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!("no configuration file found; using defaults");
        Ok(LoadedAppConfig {
            config: AppConfig::default(),
            source: None,
        })
    }

    /// Read and validate a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.render.validate()
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Salt file root; channel namespaces are created directly beneath it.
    #[serde(default = "default_salt_root")]
    pub root: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            root: default_salt_root(),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(anyhow!("render.root cannot be empty"));
        }
        Ok(())
    }

    /// Resolve `root` against the current working directory.
    pub fn absolute_root(&self) -> Result<PathBuf> {
        absolutize(&self.root)
    }
}

/// Resolve `path` against the current working directory without touching disk.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let absolute = path
        .absolutize()
        .with_context(|| format!("unable to resolve path {}", path.display()))?;
    Ok(absolute.into_owned())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgchan_logging::LogFormat;
    use std::str::FromStr;
    use tempfile::tempdir;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_str("").unwrap();
        assert_eq!(config.render.root, PathBuf::from(DEFAULT_SALT_ROOT));
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::from_str(
            r#"
            [render]
            root = "/tmp/salt"

            [logging]
            format = "pretty"
            file_prefix = "cfgchan"

            [metrics]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.render.root, PathBuf::from("/tmp/salt"));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.file_prefix.as_deref(), Some("cfgchan"));
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn empty_root_is_rejected() {
        let err = AppConfig::from_str("[render]\nroot = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("render.root"));
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let present = dir.path().join("cfgchan.toml");
        fs::write(&present, "[render]\nroot = \"/srv/custom\"\n").unwrap();

        let loaded = AppConfig::load_with_source(&[missing, present.clone()]).unwrap();
        assert_eq!(loaded.source, Some(present));
        assert_eq!(loaded.config.render.root, PathBuf::from("/srv/custom"));
    }

    #[test]
    fn no_candidates_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let loaded = AppConfig::load_with_source(&[dir.path().join("absent.toml")]).unwrap();
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config.render.root, PathBuf::from(DEFAULT_SALT_ROOT));
    }

    #[test]
    fn relative_root_is_absolutized() {
        let config = RenderConfig {
            root: PathBuf::from("salt"),
        };
        let absolute = config.absolute_root().unwrap();
        assert!(absolute.is_absolute());
        assert!(absolute.ends_with("salt"));
    }
}
