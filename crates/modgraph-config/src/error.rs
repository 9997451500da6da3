//! Configuration errors.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where a configuration file sits in the merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// `~/.modgraph/config.toml`
    Global,
    /// `<workspace>/.modgraph/config.toml`
    Local,
    /// File passed with `--config`
    Explicit,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLayer::Global => write!(f, "global"),
            ConfigLayer::Local => write!(f, "local"),
            ConfigLayer::Explicit => write!(f, "explicit"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {layer} config '{path}': {source}")]
    ReadFile {
        layer: ConfigLayer,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bad TOML, or a value `[graph]`/`[logging]` does not accept
    #[error("{layer} config '{path}' is invalid: {source}")]
    ParseToml {
        layer: ConfigLayer,
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot render config as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("cannot write config '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create config directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No home directory, so there is no global layer to write to
    #[error("no home directory; the global config (~/.modgraph/config.toml) is unavailable")]
    NoHomeDir,

    /// A merged value failed validation
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn read_file(layer: ConfigLayer, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            layer,
            path: path.into(),
            source,
        }
    }

    pub fn parse_toml(
        layer: ConfigLayer,
        path: impl Into<PathBuf>,
        source: toml::de::Error,
    ) -> Self {
        Self::ParseToml {
            layer,
            path: path.into(),
            source,
        }
    }

    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFile {
            path: path.into(),
            source,
        }
    }

    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Layer of the file the error came from, if any
    pub fn layer(&self) -> Option<ConfigLayer> {
        match self {
            ConfigError::ReadFile { layer, .. } | ConfigError::ParseToml { layer, .. } => {
                Some(*layer)
            }
            _ => None,
        }
    }
}
