//! Modgraph Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.modgraph/config.toml`
//! - Local config: `.modgraph/config.toml` (in workspace)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides. Files
//! merge key by key, so a local file only replaces the keys it writes.

mod error;
mod loader;

pub use error::{ConfigError, ConfigLayer};
pub use loader::ConfigLoader;

use std::path::{Path, PathBuf};

use modgraph_core::{GraphFormat, LayoutAlgorithm, Platform};
use serde::{Deserialize, Serialize};

/// Log levels accepted by `[logging].level`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Root configuration for Modgraph.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ModgraphConfig {
    /// Graph export defaults
    pub graph: GraphConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Defaults for `modgraph graph`.
///
/// # Example TOML
///
/// ```toml
/// [graph]
/// format = "legacy-json"
/// layout = "fdp"
/// skip_test_targets = true
/// platform = "ios"
/// output_dir = "build/graphs"
/// ```
///
/// A key written in the local file replaces the global value, `false`
/// included. `platform` and `output_dir` have no "unset" spelling, so once
/// the global file sets them a local file can change but not clear them.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GraphConfig {
    /// Output format
    pub format: GraphFormat,

    /// Layout written into DOT output
    pub layout: LayoutAlgorithm,

    /// Drop test modules
    pub skip_test_targets: bool,

    /// Drop modules coming from a dependency manager
    pub skip_external_dependencies: bool,

    /// Keep only modules supporting this platform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Where `graph.<ext>` is written; relative paths resolve against the
    /// workspace root, unset means the workspace root itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub format: Option<GraphFormat>,
    pub layout: Option<LayoutAlgorithm>,
    pub skip_test_targets: Option<bool>,
    pub skip_external_dependencies: Option<bool>,
    pub platform: Option<Platform>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ModgraphConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(format) = overrides.format {
            self.graph.format = format;
        }

        if let Some(layout) = overrides.layout {
            self.graph.layout = layout;
        }

        if let Some(skip) = overrides.skip_test_targets {
            self.graph.skip_test_targets = skip;
        }

        if let Some(skip) = overrides.skip_external_dependencies {
            self.graph.skip_external_dependencies = skip;
        }

        if let Some(platform) = overrides.platform {
            self.graph.platform = Some(platform);
        }

        if let Some(ref dir) = overrides.output_dir {
            self.graph.output_dir = Some(dir.clone());
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!(
                    "unknown level '{}', expected one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }
        Ok(())
    }

    /// Get the effective output directory for a workspace.
    pub fn output_dir(&self, workspace_root: &Path) -> PathBuf {
        match &self.graph.output_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => workspace_root.join(dir),
            None => workspace_root.to_path_buf(),
        }
    }
}
