//! Bulk transfer traits and shared types.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransferResult;

/// The two fixed directories exposed by the transfer host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteDirectory {
    /// Staging area read by import jobs.
    Upload,
    /// Output area written by export jobs.
    Download,
}

impl RemoteDirectory {
    /// Directory name on the remote host.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for RemoteDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How file contents are carried over the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Line-oriented text; line endings are normalized on the wire.
    Text,
    /// Byte-for-byte copy.
    Binary,
}

/// Opens authenticated sessions on the bulk transfer host.
#[async_trait]
pub trait BulkTransferService: Send + Sync + fmt::Debug {
    /// Connect, authenticate and change into `directory`.
    ///
    /// Connection and authentication problems are reported as
    /// [`TransferError::Connection`](crate::TransferError::Connection) or
    /// [`TransferError::Authentication`](crate::TransferError::Authentication).
    async fn open(&self, directory: RemoteDirectory) -> TransferResult<Box<dyn TransferSession>>;
}

/// One open connection, positioned in a fixed remote directory.
///
/// Callers must finish with [`TransferSession::close`], also after a failed
/// transfer. The scoped helpers in this crate do that for you.
#[async_trait]
pub trait TransferSession: Send {
    /// Upload `local` as `remote_name`. Returns the number of bytes read from disk.
    async fn put(
        &mut self,
        local: &Path,
        remote_name: &str,
        mode: TransferMode,
    ) -> TransferResult<u64>;

    /// Download `remote_name` into `local`. Returns the number of bytes written.
    async fn get(
        &mut self,
        remote_name: &str,
        local: &Path,
        mode: TransferMode,
    ) -> TransferResult<u64>;

    /// Release the connection.
    async fn close(self: Box<Self>) -> TransferResult<()>;
}

#[async_trait]
impl<S: BulkTransferService + ?Sized> BulkTransferService for std::sync::Arc<S> {
    async fn open(&self, directory: RemoteDirectory) -> TransferResult<Box<dyn TransferSession>> {
        (**self).open(directory).await
    }
}
