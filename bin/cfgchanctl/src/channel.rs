//! ---
//! cc_section: "05-external-interfaces"
//! cc_subsection: "binary"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Control CLI for administrators rendering configuration channels."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use cfgchan_common::config::AppConfig;
use cfgchan_model::{ChannelDefinition, ConfigurationChannel};
use cfgchan_render::{ChannelRenderer, RenderMetrics};
use clap::Args;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;

use crate::resolve_root;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Channel definition document (.yaml/.yml or .json).
    #[arg(long, value_name = "FILE")]
    channel: PathBuf,

    /// Salt file root to render into.
    #[arg(long, value_name = "DIR", env = "CFGCHAN_SALT_ROOT")]
    root: Option<PathBuf>,

    /// Write render metrics in Prometheus text format to this file.
    #[arg(long = "metrics-file", value_name = "FILE")]
    metrics_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Channel definition document (.yaml/.yml or .json).
    #[arg(long, value_name = "FILE")]
    channel: PathBuf,
}

#[derive(Debug, Serialize)]
struct ValidationSummary {
    channel: String,
    state_name: String,
    items: usize,
}

fn load_channel(path: &Path) -> Result<ConfigurationChannel> {
    let channel = ChannelDefinition::load(path)?
        .into_channel()
        .with_context(|| format!("unable to decode channel definition {}", path.display()))?;
    Ok(channel)
}

/// Render the channel and print a JSON summary.
pub fn render(args: RenderArgs, config: &AppConfig) -> Result<()> {
    let channel = load_channel(&args.channel)?;
    let root = resolve_root(args.root, config)?;

    let registry = Arc::new(Registry::new());
    let mut renderer = ChannelRenderer::new(root);
    if config.metrics.enabled {
        renderer = renderer.with_metrics(RenderMetrics::new(registry.clone())?);
    }

    let outcome = renderer.render(&channel);
    if let Some(path) = &args.metrics_file {
        write_metrics(&registry, path)?;
    }
    let result = outcome?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Validate the channel and print a JSON summary; fails on the first problem.
pub fn validate(args: ValidateArgs) -> Result<()> {
    let channel = load_channel(&args.channel)?;
    let validated = channel
        .validate()
        .with_context(|| format!("channel {} is invalid", channel.identity()))?;
    let summary = ValidationSummary {
        channel: channel.identity(),
        state_name: cfgchan_model::state_name(channel.org_id, &channel.label),
        items: validated.len(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn write_metrics(registry: &Registry, path: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    fs::write(path, buffer)
        .with_context(|| format!("unable to write metrics file {}", path.display()))
}
