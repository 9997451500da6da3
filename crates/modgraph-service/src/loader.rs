//! Manifest loading on the blocking thread pool.

use std::path::Path;

use async_trait::async_trait;
use modgraph_core::{LoadedGraph, ManifestLoader};

use crate::error::ServiceError;
use crate::traits::ManifestGraphLoading;

/// Loads `Project.toml` manifests with [`ManifestLoader`].
#[derive(Debug, Clone, Default)]
pub struct TomlManifestGraphLoader {
    loader: ManifestLoader,
}

impl TomlManifestGraphLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loader(loader: ManifestLoader) -> Self {
        Self { loader }
    }
}

#[async_trait]
impl ManifestGraphLoading for TomlManifestGraphLoader {
    async fn load(&self, path: &Path) -> Result<LoadedGraph, ServiceError> {
        let loader = self.loader.clone();
        let path = path.to_path_buf();
        let loaded = tokio::task::spawn_blocking(move || loader.load(&path)).await??;
        Ok(loaded)
    }
}
