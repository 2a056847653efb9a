//! ---
//! cc_section: "05-external-interfaces"
//! cc_subsection: "binary"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Control CLI for administrators rendering configuration channels."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::Result;
use cfgchan_common::config::AppConfig;
use cfgchan_model::{org_namespace, state_name, validate_label, OrgId};
use cfgchan_render::ChannelRenderer;
use clap::Args;
use serde::Serialize;

use crate::resolve_root;

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Owning organization id.
    #[arg(long = "org", value_name = "ID")]
    org: u64,

    /// Channel label.
    #[arg(long, value_name = "LABEL")]
    label: String,

    /// Salt file root the channel was rendered into.
    #[arg(long, value_name = "DIR", env = "CFGCHAN_SALT_ROOT")]
    root: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct NamespaceArgs {
    /// Organization id.
    #[arg(long = "org", value_name = "ID")]
    org: u64,

    /// Print the channel's Salt state name instead of the org segment.
    #[arg(long, value_name = "LABEL")]
    label: Option<String>,
}

#[derive(Debug, Serialize)]
struct RemoveSummary {
    namespace: PathBuf,
    removed: bool,
    files_removed: usize,
}

pub fn remove(args: RemoveArgs, config: &AppConfig) -> Result<()> {
    let renderer = ChannelRenderer::new(resolve_root(args.root, config)?);
    let org_id = OrgId::new(args.org);
    let outcome = renderer.remove(org_id, &args.label)?;
    let summary = RemoveSummary {
        namespace: renderer.namespace_path(org_id, &args.label),
        removed: outcome.is_some(),
        files_removed: outcome.unwrap_or_default(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub fn print(args: NamespaceArgs) -> Result<()> {
    let org_id = OrgId::new(args.org);
    match args.label {
        Some(label) => {
            validate_label(&label)?;
            println!("{}", state_name(org_id, &label));
        }
        None => println!("{}", org_namespace(org_id)),
    }
    Ok(())
}
