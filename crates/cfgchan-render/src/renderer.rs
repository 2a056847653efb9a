//! ---
//! cc_section: "04-channel-rendering"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Channel rendering engine and state manifest writer."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use cfgchan_logging::{chan_debug, chan_info, log_system_event, LogContext, SystemEventOutcome};
use cfgchan_model::{
    org_namespace, state_name, validate_label, ConfigurationChannel, ItemKind, OrgId,
    ValidatedChannel, MANIFEST_FILE,
};
use serde::Serialize;
use walkdir::WalkDir;

use crate::locks::NamespaceLocks;
use crate::manifest::{StateEntry, StateManifest};
use crate::metrics::RenderMetrics;
use crate::{RenderError, Result};

/// Outcome of a successful render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderResult {
    /// Directory the channel was rendered into.
    pub namespace: PathBuf,
    /// Salt state name the channel is applied under.
    pub state_name: String,
    /// Number of items described in the manifest.
    pub items: usize,
    /// Number of file items written to disk.
    pub files_written: usize,
    /// Files left over from the previous render and deleted.
    pub stale_files_removed: usize,
}

/// Renders configuration channels beneath a Salt file root.
///
/// Each render wipes the channel namespace and rebuilds it, so the tree on
/// disk always reflects exactly the current item set. Renders and removals
/// of one namespace are serialized across every renderer in the process.
#[derive(Debug, Clone)]
pub struct ChannelRenderer {
    root: PathBuf,
    locks: NamespaceLocks,
    metrics: Option<RenderMetrics>,
}

impl ChannelRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: NamespaceLocks::process(),
            metrics: None,
        }
    }

    /// Publish render counters through `metrics`.
    pub fn with_metrics(mut self, metrics: RenderMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<org-namespace>/<label>`; the label is not validated here.
    pub fn namespace_path(&self, org_id: OrgId, label: &str) -> PathBuf {
        self.root.join(org_namespace(org_id)).join(label)
    }

    /// Validate `channel` without touching disk.
    pub fn validate<'c>(
        &self,
        channel: &'c ConfigurationChannel,
    ) -> Result<ValidatedChannel<'c>> {
        channel.validate().map_err(|source| RenderError::Invalid {
            channel: channel.identity(),
            source,
        })
    }

    /// Render `channel` into its namespace and write `init.sls`.
    pub fn render(&self, channel: &ConfigurationChannel) -> Result<RenderResult> {
        let started = Instant::now();
        let outcome = self.render_locked(channel);
        let ctx = LogContext::new()
            .with_org(channel.org_id.get())
            .with_channel(&channel.label);

        match &outcome {
            Ok(result) => {
                if let Some(metrics) = &self.metrics {
                    let seconds = started.elapsed().as_secs_f64();
                    metrics.record_render(channel.org_id.get(), seconds);
                }
                log_system_event(
                    Some(&ctx),
                    "channel.render",
                    &format!(
                        "rendered {} items ({} files) into {}",
                        result.items,
                        result.files_written,
                        result.namespace.display()
                    ),
                    SystemEventOutcome::Success,
                );
            }
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(channel.org_id.get());
                }
                log_system_event(
                    Some(&ctx),
                    "channel.render",
                    &err.to_string(),
                    SystemEventOutcome::Fault,
                );
            }
        }
        outcome
    }

    fn render_locked(&self, channel: &ConfigurationChannel) -> Result<RenderResult> {
        let validated = self.validate(channel)?;
        let identity = channel.identity();
        self.ensure_root(&identity)?;

        let namespace = self.namespace_path(channel.org_id, &channel.label);
        let _guard = self.locks.lock(&namespace);

        let stale_files_removed =
            wipe_namespace(&namespace).map_err(io_error(&identity, &namespace))?;
        fs::create_dir_all(&namespace).map_err(io_error(&identity, &namespace))?;

        let ctx = LogContext::new()
            .with_org(channel.org_id.get())
            .with_channel(&channel.label);
        if stale_files_removed > 0 {
            chan_info!(
                context = ctx,
                "removed {} files from previous render",
                stale_files_removed
            );
        }

        let source_root = format!("{}/{}", org_namespace(channel.org_id), channel.label);
        let mut manifest = StateManifest::new(identity.clone());
        let mut files_written = 0usize;
        for (item, path) in validated.entries() {
            if let ItemKind::File(spec) = &item.kind {
                let target = path.under(&namespace);
                write_verbatim(&target, &spec.contents).map_err(io_error(&identity, &target))?;
                files_written += 1;
            }
            chan_debug!(
                context = ctx.clone().with_item(path.relative()),
                "{} entry added",
                item.kind.tag().as_str()
            );
            manifest.push(StateEntry::for_item(&source_root, item, path));
        }

        let text = manifest.render().map_err(|source| RenderError::Manifest {
            channel: identity.clone(),
            source,
        })?;
        let manifest_path = namespace.join(MANIFEST_FILE);
        write_verbatim(&manifest_path, text.as_bytes())
            .map_err(io_error(&identity, &manifest_path))?;

        if let Some(metrics) = &self.metrics {
            for (item, _) in validated.entries() {
                metrics.record_item(item.kind.tag().as_str());
            }
        }

        Ok(RenderResult {
            namespace,
            state_name: state_name(channel.org_id, &channel.label),
            items: manifest.len(),
            files_written,
            stale_files_removed,
        })
    }

    /// Delete a channel's rendered namespace.
    ///
    /// Returns the number of files removed, or `None` when nothing was rendered.
    pub fn remove(&self, org_id: OrgId, label: &str) -> Result<Option<usize>> {
        let identity = format!("{}/{}", org_namespace(org_id), label);
        validate_label(label).map_err(|source| RenderError::Invalid {
            channel: identity.clone(),
            source,
        })?;

        let namespace = self.namespace_path(org_id, label);
        let _guard = self.locks.lock(&namespace);

        if fs::symlink_metadata(&namespace).is_err() {
            return Ok(None);
        }
        let removed = wipe_namespace(&namespace).map_err(io_error(&identity, &namespace))?;
        log_system_event(
            Some(&LogContext::new().with_org(org_id.get()).with_channel(label)),
            "channel.remove",
            &format!("removed {} files from {}", removed, namespace.display()),
            SystemEventOutcome::Success,
        );
        Ok(Some(removed))
    }

    fn ensure_root(&self, identity: &str) -> Result<()> {
        let metadata = fs::metadata(&self.root).map_err(io_error(identity, &self.root))?;
        if !metadata.is_dir() {
            return Err(RenderError::Io {
                channel: identity.to_owned(),
                path: self.root.clone(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "render root is not a directory",
                ),
            });
        }
        Ok(())
    }
}

fn io_error<'a>(
    channel: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> RenderError + 'a {
    move |source| RenderError::Io {
        channel: channel.to_owned(),
        path: path.to_path_buf(),
        source,
    }
}

/// Remove whatever occupies `namespace`, returning how many files it held.
fn wipe_namespace(namespace: &Path) -> io::Result<usize> {
    let metadata = match fs::symlink_metadata(namespace) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };
    if !metadata.is_dir() {
        fs::remove_file(namespace)?;
        return Ok(1);
    }

    let mut files = 0;
    for entry in WalkDir::new(namespace).min_depth(1) {
        if !entry?.file_type().is_dir() {
            files += 1;
        }
    }
    fs::remove_dir_all(namespace)?;
    Ok(files)
}

fn write_verbatim(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}
