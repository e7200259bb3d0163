//! # Engage Transfer
//!
//! The bulk side channel used by Engage export and import jobs. Large files
//! never travel through the XML endpoint: imports are staged in the remote
//! `upload` directory and export artifacts are collected from `download`.
//!
//! ## Overview
//!
//! - **Traits**: [`BulkTransferService`] opens a [`TransferSession`] already
//!   authenticated and positioned in a fixed [`RemoteDirectory`].
//! - **Scoped helpers**: [`upload_files`] and [`download_file`] open one
//!   session, run the transfers, and always release the connection.
//! - **Implementations**: [`FtpTransferService`] (passive-mode FTP) and
//!   [`LocalDirectoryService`] (a local directory tree with the same layout).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use engage_transfer::{FtpConfig, FtpTransferService, TransferMode, download_file};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), engage_transfer::TransferError> {
//! let service = FtpTransferService::new(FtpConfig::new("transfer.example.com", "user", "secret"));
//! let bytes = download_file(&service, "export_123.csv", Path::new("/tmp/export.csv"), TransferMode::Text).await?;
//! println!("downloaded {bytes} bytes");
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod error;
mod ftp;
mod local;
mod scope;
mod traits;

pub use error::{TransferError, TransferResult};
pub use ftp::{DEFAULT_FTP_PORT, FtpConfig, FtpTransferService};
pub use local::LocalDirectoryService;
pub use scope::{download_file, remote_name_for, upload_files};
pub use traits::{BulkTransferService, RemoteDirectory, TransferMode, TransferSession};
