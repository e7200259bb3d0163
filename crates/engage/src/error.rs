//! Error types for the Engage client.
//!
//! Lower layers keep their own error enums ([`TransportError`],
//! [`TransferError`]). They are folded into [`EngageError`] here; transfer
//! failures are classified so callers can tell a dead channel from a bad file.

use std::time::Duration;

use engage_transfer::TransferError;
use engage_transport::TransportError;
use thiserror::Error;

use crate::config::ConfigError;

/// A specialized `Result` type for Engage operations.
pub type Result<T> = std::result::Result<T, EngageError>;

/// Errors raised by the Engage client.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EngageError {
    /// Login was rejected, or the login response lacked session fields.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An operation that needs a session was called without one.
    #[error("Not logged in; call login() before {operation}")]
    NotLoggedIn {
        /// Operation that was attempted
        operation: String,
    },

    /// The server answered with `SUCCESS` other than true.
    #[error("{operation} failed: {fault}")]
    RemoteOperation {
        /// Operation element name (e.g. `ExportList`)
        operation: String,
        /// Server fault text
        fault: String,
    },

    /// A polled job reached a failed terminal state.
    #[error("Job {job_id} ended with status {status}")]
    JobFailed {
        /// Job identifier
        job_id: String,
        /// Last status reported by the server
        status: String,
        /// Server description of the job, if any
        description: Option<String>,
    },

    /// A polled job did not reach a terminal state within the poll policy.
    #[error("Job {job_id} still running after {attempts} status checks ({elapsed:?})")]
    JobTimeout {
        /// Job identifier
        job_id: String,
        /// Number of status queries issued
        attempts: u32,
        /// Time spent polling
        elapsed: Duration,
    },

    /// Polling was cancelled by the caller.
    #[error("Polling of job {job_id} was cancelled")]
    Cancelled {
        /// Job identifier
        job_id: String,
    },

    /// The bulk transfer channel could not be established.
    #[error("Transfer channel unavailable: {0}")]
    TransferConnection(#[source] TransferError),

    /// A download finished but produced a missing or empty file.
    #[error("Transfer integrity check failed: {0}")]
    TransferIntegrity(#[source] TransferError),

    /// Any other transfer failure.
    #[error("Transfer failed: {0}")]
    Transfer(#[source] TransferError),

    /// A bulk operation was requested but no transfer service is configured.
    #[error("No bulk transfer service configured")]
    TransferUnavailable,

    /// The transport failed before a response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A successful response lacked a field the operation needs.
    #[error("Response is missing required field {field}")]
    MalformedResponse {
        /// Element name that was expected
        field: &'static str,
    },

    /// A request option was rejected while building the payload.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Configuration could not be loaded or applied.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local I/O failed (e.g. writing a map file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransferError> for EngageError {
    fn from(err: TransferError) -> Self {
        if err.is_connection_failure() {
            Self::TransferConnection(err)
        } else if matches!(err, TransferError::Integrity { .. }) {
            Self::TransferIntegrity(err)
        } else {
            Self::Transfer(err)
        }
    }
}

impl EngageError {
    /// Returns `true` for errors that come from the server rejecting a call,
    /// as opposed to local or transport problems.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_) | Self::RemoteOperation { .. } | Self::JobFailed { .. }
        )
    }
}
