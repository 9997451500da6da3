//! CLI command implementations

pub mod config;
pub mod graph;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use modgraph_config::{ConfigLoader, ConfigOverrides, ModgraphConfig};

use crate::GlobalOptions;

/// Resolve a user-supplied path against the current directory.
pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let path = match path {
        Some(path) => cwd.join(path),
        None => return Ok(cwd),
    };
    path.canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))
}

/// Make `path` absolute without requiring it to exist.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()
        .context("Failed to get current directory")?
        .join(path))
}

/// Load configuration, honouring `--config`.
pub fn load_config(
    global: &GlobalOptions,
    workspace: &Path,
    overrides: Option<&ConfigOverrides>,
) -> Result<ModgraphConfig> {
    let mut loader = ConfigLoader::new();

    if let Some(ref config_path) = global.config {
        return loader
            .load_file(config_path, overrides)
            .with_context(|| format!("Failed to load config file {}", config_path.display()));
    }

    loader
        .load(workspace, overrides)
        .context("Failed to load configuration")
}

/// Print an info message to stderr (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
