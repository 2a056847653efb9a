//! ---
//! cc_section: "05-external-interfaces"
//! cc_subsection: "binary"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Control CLI for administrators rendering configuration channels."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cfgchan_common::config::{absolutize, AppConfig};
use cfgchan_logging as logging;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};

mod channel;
mod namespace;

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Configuration channel state renderer",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print version information and exit"
    )]
    version: bool,

    /// Configuration file (defaults to CFGCHAN_CONFIG, /etc/cfgchan/cfgchan.toml, ./cfgchan.toml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the configured rolling JSON log file, in the configured console format.
    #[arg(long = "service-logs", global = true, action = ArgAction::SetTrue)]
    service_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render a channel definition into its namespace.
    Render(channel::RenderArgs),
    /// Decode and validate a channel definition without writing anything.
    Validate(channel::ValidateArgs),
    /// Delete a channel's rendered namespace.
    Remove(namespace::RemoveArgs),
    /// Print the namespace segment of an organization or the state name of a channel.
    Namespace(namespace::NamespaceArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("cfgchanctl {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    if cli.service_logs {
        logging::init_service("cfgchanctl", &config.logging)
            .context("unable to initialise log sinks")?;
    } else {
        logging::init();
    }

    match cli.command {
        Some(Commands::Render(args)) => channel::render(args, &config),
        Some(Commands::Validate(args)) => channel::validate(args),
        Some(Commands::Remove(args)) => namespace::remove(args, &config),
        Some(Commands::Namespace(args)) => namespace::print(args),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    match explicit {
        Some(path) => AppConfig::from_path(path),
        None => Ok(AppConfig::load_with_source(&AppConfig::DEFAULT_CANDIDATES)
            .context("unable to load configuration")?
            .config),
    }
}

/// Effective render root, absolute: explicit flag or `CFGCHAN_SALT_ROOT`, then configuration.
pub(crate) fn resolve_root(flag: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    match flag {
        Some(root) => absolutize(&root),
        None => config.render.absolute_root(),
    }
}
