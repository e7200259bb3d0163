//! Core `EngageClient<T>` type.
//!
//! `EngageClient<T>` is a cheaply-cloneable `Arc` wrapper. All clones share
//! the transport, the session and the transfer service.

use std::sync::Arc;

use engage_transfer::{BulkTransferService, FtpTransferService};
use engage_transport::{HttpTransport, Transport, TransportMetrics};

use super::builder::ClientBuilder;
use super::protocol::ProtocolClient;
use super::session::{Credentials, SessionState};
use crate::config::EngageConfig;
use crate::error::{EngageError, Result};
use crate::job::JobPoller;

/// Shared client state.
pub(super) struct ClientInner<T: Transport + 'static> {
    pub(super) protocol: ProtocolClient<T>,
    pub(super) session: SessionState,
    pub(super) credentials: Option<Credentials>,
    pub(super) transfer: Option<Arc<dyn BulkTransferService>>,
    pub(super) poller: JobPoller,
}

/// Client for the Engage XML API.
///
/// Holds at most one session. Every call made through
/// [`execute`](Self::execute) carries the session encoding obtained at login.
/// Bulk operations additionally need a [`BulkTransferService`].
///
/// ```rust,no_run
/// use engage::{ClientBuilder, Credentials, HttpTransport};
/// use engage_transport::HttpTransportConfig;
///
/// # async fn example() -> engage::Result<()> {
/// let transport = HttpTransport::new(HttpTransportConfig::new("https://api.example.com/XMLAPI"))?;
/// let client = ClientBuilder::new(transport)
///     .with_credentials(Credentials::new("api-user", "secret"))
///     .build();
///
/// client.login().await?;
/// let lists = client.get_lists(0, 2).await?;
/// println!("{}", lists.text());
/// # Ok(())
/// # }
/// ```
pub struct EngageClient<T: Transport + 'static> {
    pub(super) inner: Arc<ClientInner<T>>,
}

impl<T: Transport + 'static> Clone for EngageClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport + 'static> std::fmt::Debug for EngageClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngageClient")
            .field("transport", self.inner.protocol.transport())
            .field("session", &self.inner.session.snapshot())
            .field("credentials", &self.inner.credentials)
            .field("transfer", &self.inner.transfer)
            .field("poll_policy", self.inner.poller.policy())
            .finish()
    }
}

impl<T: Transport + 'static> EngageClient<T> {
    /// Client over `transport` with no credentials, no transfer service and
    /// the default poll policy. Use [`ClientBuilder`] for anything else.
    pub fn new(transport: T) -> Self {
        ClientBuilder::new(transport).build()
    }

    pub(super) fn from_parts(
        transport: T,
        credentials: Option<Credentials>,
        transfer: Option<Arc<dyn BulkTransferService>>,
        poller: JobPoller,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                protocol: ProtocolClient::new(transport),
                session: SessionState::default(),
                credentials,
                transfer,
                poller,
            }),
        }
    }

    /// The job poller used by export operations.
    pub fn poller(&self) -> &JobPoller {
        &self.inner.poller
    }

    /// Transport counters.
    pub fn metrics(&self) -> TransportMetrics {
        self.inner.protocol.transport().metrics()
    }

    pub(super) fn transfer_service(&self) -> Result<Arc<dyn BulkTransferService>> {
        self.inner
            .transfer
            .clone()
            .ok_or(EngageError::TransferUnavailable)
    }
}

impl EngageClient<HttpTransport> {
    /// Build an HTTP client (and FTP transfer service, when configured) from
    /// configuration.
    pub fn from_config(config: &EngageConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.api.transport_config())?;
        let mut builder = ClientBuilder::new(transport)
            .with_credentials(config.api.credentials())
            .with_poll_policy(config.poll_policy());
        if let Some(transfer) = &config.transfer {
            builder = builder.with_transfer(FtpTransferService::new(transfer.ftp_config()));
        }
        Ok(builder.build())
    }
}
