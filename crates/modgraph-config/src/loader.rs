//! Layered configuration loading.
//!
//! | Layer | File |
//! |-------|------|
//! | global | `~/.modgraph/config.toml` |
//! | local | `<workspace>/.modgraph/config.toml` |
//! | explicit | `--config <file>`, used instead of the two above |
//!
//! Files are read as raw TOML tables and merged key by key before anything
//! is deserialized. A key written in a later file always wins, including
//! `skip_test_targets = false` or `format = "dot"`; a key it omits falls
//! through to the layer below. CLI overrides are applied to the result.

use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::{debug, trace};

use crate::error::{ConfigError, ConfigLayer};
use crate::{ConfigOverrides, ModgraphConfig};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory holding `config.toml`, under the home dir or a workspace
const CONFIG_DIR: &str = ".modgraph";

/// Reads, merges and writes configuration files.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// `~/.modgraph`, if there is a home directory
    global_config_dir: Option<PathBuf>,

    /// Global table, read at most once
    global_table: Option<Table>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_config_dir: dirs::home_dir().map(|home| home.join(CONFIG_DIR)),
            global_table: None,
        }
    }

    /// Loader whose global layer lives in `global_dir` instead of the home
    /// directory.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_table: None,
        }
    }

    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
    }

    pub fn local_config_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Effective configuration for `workspace_root`: global, then local,
    /// then `overrides`.
    pub fn load(
        &mut self,
        workspace_root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<ModgraphConfig, ConfigError> {
        let mut merged = Table::new();
        if let Some(global) = self.global_table()? {
            merge_tables(&mut merged, global);
        }
        if let Some(local) = self.local_table(workspace_root)? {
            merge_tables(&mut merged, local);
        }
        finish(merged, overrides)
    }

    /// Configuration from a single `--config` file, then `overrides`.
    pub fn load_file(
        &self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<ModgraphConfig, ConfigError> {
        debug!("Loading explicit config from {:?}", path);
        finish(read_table(ConfigLayer::Explicit, path)?, overrides)
    }

    /// The global layer alone, with defaults for missing keys
    pub fn load_global(&mut self) -> Result<Option<ModgraphConfig>, ConfigError> {
        self.global_table()?.map(into_config).transpose()
    }

    /// The local layer alone, with defaults for missing keys
    pub fn load_local(&self, workspace_root: &Path) -> Result<Option<ModgraphConfig>, ConfigError> {
        self.local_table(workspace_root)?
            .map(into_config)
            .transpose()
    }

    pub fn save_global(&self, config: &ModgraphConfig) -> Result<(), ConfigError> {
        let path = self.global_config_path().ok_or(ConfigError::NoHomeDir)?;
        save_config_file(&path, config)
    }

    pub fn save_local(
        &self,
        workspace_root: &Path,
        config: &ModgraphConfig,
    ) -> Result<(), ConfigError> {
        save_config_file(&self.local_config_path(workspace_root), config)
    }

    /// Write `~/.modgraph/config.toml` with the defaults unless it exists.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let path = self.global_config_path().ok_or(ConfigError::NoHomeDir)?;
        init_file(path, ModgraphConfig::default)
    }

    /// Write `<workspace>/.modgraph/config.toml` unless it exists.
    ///
    /// Every key is written out, so the new file is seeded from the global
    /// layer rather than the defaults; otherwise it would pin every global
    /// setting back to its default.
    pub fn init_local(&self, workspace_root: &Path) -> Result<PathBuf, ConfigError> {
        let seed = match self.global_config_path() {
            Some(path) if path.exists() => into_config(read_table(ConfigLayer::Global, &path)?)?,
            _ => ModgraphConfig::default(),
        };
        init_file(self.local_config_path(workspace_root), || seed)
    }

    /// Forget the cached global layer.
    pub fn clear_cache(&mut self) {
        self.global_table = None;
    }

    fn global_table(&mut self) -> Result<Option<Table>, ConfigError> {
        if let Some(ref table) = self.global_table {
            return Ok(Some(table.clone()));
        }

        let Some(path) = self.global_config_path() else {
            debug!("No home directory, skipping global config");
            return Ok(None);
        };
        if !path.exists() {
            trace!("No global config at {:?}", path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", path);
        let table = read_table(ConfigLayer::Global, &path)?;
        self.global_table = Some(table.clone());
        Ok(Some(table))
    }

    fn local_table(&self, workspace_root: &Path) -> Result<Option<Table>, ConfigError> {
        let path = self.local_config_path(workspace_root);
        if !path.exists() {
            trace!("No local config at {:?}", path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", path);
        read_table(ConfigLayer::Local, &path).map(Some)
    }
}

/// Read one layer. The file is also checked against [`ModgraphConfig`] on
/// its own, so a bad value is reported against the file that holds it.
fn read_table(layer: ConfigLayer, path: &Path) -> Result<Table, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(layer, path, e))?;
    toml::from_str::<ModgraphConfig>(&content)
        .map_err(|e| ConfigError::parse_toml(layer, path, e))?;
    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(layer, path, e))
}

/// Merge `overlay` into `base`. Nested tables merge recursively, any other
/// value in `overlay` replaces the one in `base`.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match value {
            Value::Table(incoming) => {
                if let Some(Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                    continue;
                }
                base.insert(key, Value::Table(incoming));
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}

fn into_config(table: Table) -> Result<ModgraphConfig, ConfigError> {
    Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::invalid_value("config", e.to_string()))
}

fn finish(
    table: Table,
    overrides: Option<&ConfigOverrides>,
) -> Result<ModgraphConfig, ConfigError> {
    let mut config = into_config(table)?;
    if let Some(overrides) = overrides {
        config.apply_overrides(overrides);
    }
    config.validate()?;
    Ok(config)
}

fn init_file(
    path: PathBuf,
    seed: impl FnOnce() -> ModgraphConfig,
) -> Result<PathBuf, ConfigError> {
    if !path.exists() {
        save_config_file(&path, &seed())?;
    }
    Ok(path)
}

fn save_config_file(path: &Path, config: &ModgraphConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}
