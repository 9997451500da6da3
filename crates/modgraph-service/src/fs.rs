//! File system implementations.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::traits::{AsyncFileSystem, FileSystem};

/// The local disk, through `std::fs` and `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        std::fs::exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }
}

#[async_trait]
impl AsyncFileSystem for LocalFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(path).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }
}

/// Exposes a blocking [`FileSystem`] as an [`AsyncFileSystem`] by running
/// each call on the blocking thread pool.
#[derive(Debug)]
pub struct BlockingFileSystem<F> {
    inner: Arc<F>,
}

impl<F> Clone for BlockingFileSystem<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: FileSystem + 'static> BlockingFileSystem<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    async fn run<T, C>(&self, call: C) -> io::Result<T>
    where
        T: Send + 'static,
        C: FnOnce(&F) -> io::Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || call(&inner))
            .await
            .map_err(io::Error::other)?
    }
}

#[async_trait]
impl<F: FileSystem + 'static> AsyncFileSystem for BlockingFileSystem<F> {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let path = path.to_path_buf();
        self.run(move |fs| fs.exists(&path)).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = path.to_path_buf();
        self.run(move |fs| fs.create_dir_all(&path)).await
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let path = path.to_path_buf();
        self.run(move |fs| fs.read_to_string(&path)).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let path = path.to_path_buf();
        let contents = contents.to_vec();
        self.run(move |fs| fs.write(&path, &contents)).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        let path = path.to_path_buf();
        self.run(move |fs| fs.remove_file(&path)).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let (from, to): (PathBuf, PathBuf) = (from.to_path_buf(), to.to_path_buf());
        self.run(move |fs| fs.rename(&from, &to)).await
    }
}
