//! Local directory transfer service.
//!
//! Mirrors the remote layout (`<root>/upload`, `<root>/download`) on the
//! local filesystem. Useful for staging environments that mount the
//! transfer area, and as a test double for the FTP service.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{TransferError, TransferResult};
use crate::traits::{BulkTransferService, RemoteDirectory, TransferMode, TransferSession};

/// [`BulkTransferService`] backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct LocalDirectoryService {
    root: PathBuf,
}

impl LocalDirectoryService {
    /// Create a service rooted at `root`. The fixed directories are created on demand.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a fixed directory under the root.
    pub fn directory(&self, directory: RemoteDirectory) -> PathBuf {
        self.root.join(directory.as_str())
    }
}

#[async_trait]
impl BulkTransferService for LocalDirectoryService {
    async fn open(&self, directory: RemoteDirectory) -> TransferResult<Box<dyn TransferSession>> {
        if !tokio::fs::try_exists(&self.root).await? {
            return Err(TransferError::Connection(format!(
                "transfer root {} does not exist",
                self.root.display()
            )));
        }

        let dir = self.directory(directory);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| TransferError::Directory {
                directory: directory.to_string(),
                reason: e.to_string(),
            })?;

        debug!(directory = %dir.display(), "opened local transfer session");
        Ok(Box::new(LocalSession { dir }))
    }
}

#[derive(Debug)]
struct LocalSession {
    dir: PathBuf,
}

impl LocalSession {
    fn remote_path(&self, remote_name: &str) -> TransferResult<PathBuf> {
        let name = Path::new(remote_name);
        // Only plain names are valid inside a fixed directory
        if name.components().count() != 1 || name.file_name().is_none() {
            return Err(TransferError::Transfer {
                file: remote_name.to_string(),
                reason: "remote name must be a plain file name".to_string(),
            });
        }
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl TransferSession for LocalSession {
    async fn put(
        &mut self,
        local: &Path,
        remote_name: &str,
        _mode: TransferMode,
    ) -> TransferResult<u64> {
        let target = self.remote_path(remote_name)?;
        tokio::fs::copy(local, &target)
            .await
            .map_err(|e| TransferError::Transfer {
                file: remote_name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn get(
        &mut self,
        remote_name: &str,
        local: &Path,
        _mode: TransferMode,
    ) -> TransferResult<u64> {
        let source = self.remote_path(remote_name)?;
        tokio::fs::copy(&source, local)
            .await
            .map_err(|e| TransferError::Transfer {
                file: remote_name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn close(self: Box<Self>) -> TransferResult<()> {
        Ok(())
    }
}
