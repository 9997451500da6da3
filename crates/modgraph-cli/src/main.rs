//! Modgraph CLI - Module dependency graph generation
//!
//! A command-line interface that loads a workspace's module manifests,
//! filters the resulting dependency graph and exports it as Graphviz DOT or
//! JSON.
//!
//! # Usage
//!
//! ```bash
//! # Export the whole workspace as graph.dot
//! modgraph graph
//!
//! # Export App and its dependencies as JSON, without tests
//! modgraph graph --format json --skip-test-targets App
//!
//! # Create a local configuration file
//! modgraph config init
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use modgraph_config::{ConfigOverrides, LogFormat, LoggingConfig, ModgraphConfig};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;
mod output;

/// Modgraph - Module dependency graph export
#[derive(Parser, Debug)]
#[command(name = "modgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to configuration file (replaces global and local config)
    #[arg(long, short = 'c', global = true, env = "MODGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

impl GlobalOptions {
    /// Log level forced by `--quiet` or `--verbose`
    fn log_level(&self) -> Option<String> {
        if self.quiet {
            Some("error".to_string())
        } else if self.verbose {
            Some("debug".to_string())
        } else {
            None
        }
    }

    /// Overrides carried by the global flags alone
    fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            log_level: self.log_level(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the module dependency graph of a workspace
    Graph(commands::graph::GraphArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

impl Commands {
    /// Workspace whose configuration applies to this command
    fn workspace(&self) -> Result<PathBuf> {
        match self {
            Commands::Graph(args) => commands::resolve_path(args.path.as_deref()),
            Commands::Config(_) => commands::resolve_path(None),
        }
    }
}

/// Install the global subscriber. A level forced by flags wins over
/// `RUST_LOG`, which wins over the configured level.
fn init_tracing(forced: bool, logging: &LoggingConfig) -> Result<()> {
    let filter = if forced {
        EnvFilter::new(&logging.level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Text => {
            tracing::subscriber::set_global_default(builder.with_ansi(true).finish())?
        }
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config file is reported by the command itself.
    let overrides = cli.global.config_overrides();
    let logging = cli
        .command
        .workspace()
        .and_then(|workspace| commands::load_config(&cli.global, &workspace, Some(&overrides)))
        .unwrap_or_else(|_| {
            let mut config = ModgraphConfig::default();
            config.apply_overrides(&overrides);
            config
        })
        .logging;
    init_tracing(overrides.log_level.is_some(), &logging)?;

    match cli.command {
        Commands::Graph(args) => commands::graph::execute(args, cli.global).await,
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global).await,
    }
}
