//! Engage client implementation
//!
//! - `core`: `EngageClient<T>` and its shared state
//! - `builder`: `ClientBuilder`
//! - `session`: login, logout and the session encoding
//! - `protocol`: envelope send/receive (`execute`, `execute_unchecked`)
//! - `operations`: single-call operations and job status
//! - `bulk`: export/import orchestration over the transfer channel

mod builder;
mod bulk;
mod core;
mod operations;
mod protocol;
mod session;

pub use builder::ClientBuilder;
pub use bulk::TransferArtifact;
pub use self::core::EngageClient;
pub use session::{Credentials, Session};
