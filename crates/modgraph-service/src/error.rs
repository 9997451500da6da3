//! Service error types.

use std::path::{Path, PathBuf};

use modgraph_core::{ExportError, GraphError, LoaderError, MapperError};
use thiserror::Error;

/// Errors that can occur while generating a graph.
///
/// Every variant is terminal: the service stops at the first failure and
/// no artifact or notification is produced after it.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The loader could not produce a graph
    #[error("failed to load manifests: {0}")]
    ManifestLoad(#[from] LoaderError),

    /// The loaded graph is inconsistent
    #[error("loaded graph is invalid: {0}")]
    InvalidGraph(#[from] GraphError),

    /// A pipeline stage failed
    #[error("mapper '{stage}' failed: {source}")]
    Mapper {
        stage: String,
        #[source]
        source: MapperError,
    },

    /// Encoding the final graph failed
    #[error("failed to encode graph: {0}")]
    Export(#[from] ExportError),

    /// The artifact could not be written
    #[error("failed to write graph to '{path}': {source}")]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The exported artifact could not be opened
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    pub fn export_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::ExportIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn open(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<MapperError> for ServiceError {
    fn from(source: MapperError) -> Self {
        Self::Mapper {
            stage: source.mapper().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapper_error_names_stage() {
        let err: ServiceError = MapperError::failed("platform", "environment poisoned").into();
        assert!(matches!(err, ServiceError::Mapper { ref stage, .. } if stage == "platform"));
        assert!(err.to_string().contains("'platform'"));
    }

    #[test]
    fn test_export_io_names_path() {
        let err = ServiceError::export_io(
            "/out/graph.dot",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/out/graph.dot"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_manifest_error_is_kept_verbatim() {
        let err: ServiceError = LoaderError::NoManifest(PathBuf::from("/ws")).into();
        match err {
            ServiceError::ManifestLoad(LoaderError::NoManifest(path)) => {
                assert_eq!(path, PathBuf::from("/ws"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
