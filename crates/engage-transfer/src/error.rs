//! Transfer error types.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for bulk transfer operations.
pub type TransferResult<T> = std::result::Result<T, TransferError>;

/// Errors raised by the bulk transfer channel.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransferError {
    /// Could not reach the transfer host.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The transfer host rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Could not switch into the fixed remote directory.
    #[error("Cannot enter remote directory '{directory}': {reason}")]
    Directory {
        /// The directory that was requested
        directory: String,
        /// Server reason
        reason: String,
    },

    /// A single file transfer failed.
    #[error("Transfer of '{file}' failed: {reason}")]
    Transfer {
        /// Remote file name
        file: String,
        /// Failure reason
        reason: String,
    },

    /// The transfer finished but the local file is missing or empty.
    #[error("Integrity check failed for {}: {reason}", path.display())]
    Integrity {
        /// Local file that was checked
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The server answered with something the client cannot interpret.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A local path cannot be used as a transfer source.
    #[error("Invalid local path {}: {reason}", path.display())]
    InvalidPath {
        /// The offending path
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// An operation did not complete in time.
    #[error("Timed out during {0}")]
    Timeout(String),

    /// An underlying I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Returns `true` when the channel itself could not be established
    /// (connection or authentication), as opposed to a failed transfer.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Authentication(_) | Self::Directory { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failure_classification() {
        assert!(TransferError::Connection("refused".into()).is_connection_failure());
        assert!(TransferError::Authentication("530".into()).is_connection_failure());
        assert!(
            !TransferError::Transfer {
                file: "a.csv".into(),
                reason: "550".into()
            }
            .is_connection_failure()
        );
        assert!(
            !TransferError::Integrity {
                path: PathBuf::from("/tmp/a.csv"),
                reason: "empty".into()
            }
            .is_connection_failure()
        );
    }
}
