//! Seams between the service and the outside world.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use modgraph_core::LoadedGraph;

use crate::error::ServiceError;
use crate::notification::ExportNotification;

/// Produces the initial graph for a source path.
#[async_trait]
pub trait ManifestGraphLoading: Send + Sync {
    /// Load the graph rooted at `path`.
    ///
    /// Loader failures are reported as [`ServiceError::ManifestLoad`] and are
    /// passed through to the caller unchanged.
    async fn load(&self, path: &Path) -> Result<LoadedGraph, ServiceError>;
}

/// Blocking file operations.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> io::Result<bool>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Awaitable file operations, same contract as [`FileSystem`].
#[async_trait]
pub trait AsyncFileSystem: Send + Sync {
    async fn exists(&self, path: &Path) -> io::Result<bool>;
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    async fn remove_file(&self, path: &Path) -> io::Result<()>;
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Receives the notifications of an export, in emission order.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: ExportNotification);
}

/// Opens an exported artifact for the user.
pub trait ArtifactOpener: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<()>;
}
