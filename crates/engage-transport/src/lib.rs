//! # Engage Transport
//!
//! The leaf of the Engage client stack: a [`Transport`] takes one serialized
//! XML envelope plus the caller's session encoding and returns the raw
//! response body. It performs exactly one exchange per call and never
//! retries on its own.
//!
//! ## Overview
//!
//! - **Traits**: [`Transport`]
//! - **Types**: [`TransportRequest`]
//! - **Errors**: [`TransportError`], [`TransportResult`]
//! - **Config**: [`LimitsConfig`], [`TimeoutConfig`], [`HttpTransportConfig`]
//! - **Metrics**: [`TransportMetrics`], [`AtomicMetrics`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use engage_transport::{HttpTransport, HttpTransportConfig, Transport, TransportRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(HttpTransportConfig::new(
//!     "https://api.example.com/XMLAPI",
//! ))?;
//!
//! let request = TransportRequest::new("<Envelope><Body><Logout/></Body></Envelope>")
//!     .with_session_encoding(";jsessionid=ABC123");
//! let raw = transport.send(request).await?;
//! println!("{} bytes", raw.len());
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
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod config;
mod error;
mod http;
mod message;
mod metrics;
mod traits;

pub use config::{HttpTransportConfig, LimitsConfig, TimeoutConfig};
pub use error::{TransportError, TransportResult, validate_request_size, validate_response_size};
pub use http::HttpTransport;
pub use message::TransportRequest;
pub use metrics::{AtomicMetrics, TransportMetrics};
pub use traits::Transport;
