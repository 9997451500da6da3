//! Config command - View and manage configuration

use anyhow::{Context, Result};
use clap::Subcommand;
use modgraph_config::ConfigLoader;

use super::{load_config, resolve_path};
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Create a configuration file with default values
    Init(InitArgs),

    /// Print the effective configuration as TOML
    Show,

    /// Show configuration file paths
    Path,
}

/// Arguments for the init command
#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Create ~/.modgraph/config.toml instead of the workspace file
    #[arg(long)]
    global: bool,
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Init(args) => execute_init(args),
        ConfigCommand::Show => execute_show(&global),
        ConfigCommand::Path => execute_path(),
    }
}

fn execute_init(args: InitArgs) -> Result<()> {
    let loader = ConfigLoader::new();
    let created = if args.global {
        loader.init_global()
    } else {
        let workspace = resolve_path(None)?;
        loader.init_local(&workspace)
    };
    let path = created.context("Failed to initialize configuration")?;

    println!("Configuration file: {}", path.display());
    Ok(())
}

fn execute_show(global: &GlobalOptions) -> Result<()> {
    let workspace = resolve_path(None)?;
    let config = load_config(global, &workspace, Some(&global.config_overrides()))?;
    let content = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    print!("{}", content);
    Ok(())
}

fn execute_path() -> Result<()> {
    let workspace = resolve_path(None)?;
    let loader = ConfigLoader::new();

    match loader.global_config_path() {
        Some(path) => println!("global: {} ({})", path.display(), existence(path.exists())),
        None => println!("global: (no home directory)"),
    }
    let local = loader.local_config_path(&workspace);
    println!("local:  {} ({})", local.display(), existence(local.exists()));
    Ok(())
}

fn existence(exists: bool) -> &'static str {
    if exists {
        "exists"
    } else {
        "missing"
    }
}
