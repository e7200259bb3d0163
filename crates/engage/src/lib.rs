//! # Engage
//!
//! Client for the Engage XML API: a session-authenticated endpoint that takes
//! `<Envelope><Body>...</Body></Envelope>` documents, plus the bulk transfer
//! channel used by long-running export and import jobs.
//!
//! ## Architecture
//!
//! ```text
//! caller ──► EngageClient (session) ──► execute() ──► Transport ──► endpoint
//!                 │
//!                 ├─ export: JOB_ID ──► JobPoller ──► on ready ──► download_file()
//!                 └─ import: upload_files() ──► ImportList / ImportTable
//! ```
//!
//! - [`EngageClient`] owns the session (id + encoding) and every remote call.
//! - [`Response`] interprets `SUCCESS` / `FaultString` once per call.
//! - [`JobPoller`] polls `GetJobStatus` under an explicit [`PollPolicy`] and
//!   a cancellation token.
//! - Bulk operations stage files through an
//!   [`engage_transfer::BulkTransferService`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use engage::{EngageClient, EngageConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> engage::Result<()> {
//! let config = EngageConfig::from_file("engage.toml")?;
//! let client = EngageClient::from_config(&config)?;
//!
//! client.login().await?;
//! let artifact = client
//!     .export_list(123456, &["EMAIL", "FIRST_NAME"], "/tmp/list.csv", &CancellationToken::new())
//!     .await?;
//! println!("saved {} bytes to {}", artifact.bytes, artifact.local_path.display());
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Limitations
//!
//! The client never logs in again on its own. When a call fails because the
//! session expired, the caller has to call [`EngageClient::login`] and retry.

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

pub mod client;
pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod payload;
pub mod response;

pub use client::{ClientBuilder, Credentials, EngageClient, Session, TransferArtifact};
pub use config::{ApiConfig, ConfigError, EngageConfig, LoggingConfig, PollConfig, TransferSettings};
pub use error::{EngageError, Result};
pub use job::{JobPoller, JobReport, JobStatus, JobStatusSource, PollPolicy};
pub use payload::RequestBody;
pub use response::Response;

pub use engage_transfer::{BulkTransferService, RemoteDirectory, TransferMode};
pub use engage_transport::{HttpTransport, Transport};
pub use tokio_util::sync::CancellationToken;
