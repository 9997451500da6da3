//! Artifact writing.
//!
//! The artifact is written next to its destination under a `.tmp` name and
//! renamed into place, so a failed write never leaves a partial artifact
//! behind. A previous artifact is removed right before the rename.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ServiceError;
use crate::traits::AsyncFileSystem;

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub path: PathBuf,
    /// A previous artifact existed and was deleted
    pub replaced: bool,
}

/// Path of the temporary file used while writing `destination`.
pub fn temp_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    destination.with_file_name(name)
}

/// Write `contents` to `destination`, replacing any existing file.
pub async fn write_artifact(
    fs: &dyn AsyncFileSystem,
    destination: &Path,
    contents: &[u8],
) -> Result<WriteOutcome, ServiceError> {
    let temp = temp_path(destination);

    let result: std::io::Result<bool> = async {
        if let Some(dir) = destination.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs.create_dir_all(dir).await?;
        }
        fs.write(&temp, contents).await?;

        let replaced = fs.exists(destination).await?;
        if replaced {
            fs.remove_file(destination).await?;
        }
        fs.rename(&temp, destination).await?;
        Ok::<_, std::io::Error>(replaced)
    }
    .await;

    match result {
        Ok(replaced) => {
            debug!(path = ?destination, bytes = contents.len(), replaced, "Wrote artifact");
            Ok(WriteOutcome {
                path: destination.to_path_buf(),
                replaced,
            })
        }
        Err(source) => {
            if matches!(fs.exists(&temp).await, Ok(true)) {
                if let Err(e) = fs.remove_file(&temp).await {
                    debug!("Failed to remove {:?}: {}", temp, e);
                }
            }
            Err(ServiceError::export_io(destination, source))
        }
    }
}
