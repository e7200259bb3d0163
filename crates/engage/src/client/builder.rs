//! Client builder.

use std::sync::Arc;

use engage_transfer::BulkTransferService;
use engage_transport::Transport;

use super::core::EngageClient;
use super::session::Credentials;
use crate::job::{JobPoller, PollPolicy};

/// Builder for [`EngageClient`].
#[derive(Debug)]
pub struct ClientBuilder<T: Transport + 'static> {
    transport: T,
    credentials: Option<Credentials>,
    transfer: Option<Arc<dyn BulkTransferService>>,
    poll_policy: PollPolicy,
}

impl<T: Transport + 'static> ClientBuilder<T> {
    /// Start from a transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            credentials: None,
            transfer: None,
            poll_policy: PollPolicy::default(),
        }
    }

    /// Credentials used by [`EngageClient::login`].
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Service used by bulk exports and imports.
    #[must_use]
    pub fn with_transfer(mut self, service: impl BulkTransferService + 'static) -> Self {
        self.transfer = Some(Arc::new(service));
        self
    }

    /// Same as [`with_transfer`](Self::with_transfer) for an already shared service.
    #[must_use]
    pub fn with_shared_transfer(mut self, service: Arc<dyn BulkTransferService>) -> Self {
        self.transfer = Some(service);
        self
    }

    /// Bounds for job polling.
    #[must_use]
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    /// Build the client. No network traffic happens until the first call.
    pub fn build(self) -> EngageClient<T> {
        EngageClient::from_parts(
            self.transport,
            self.credentials,
            self.transfer,
            JobPoller::new(self.poll_policy),
        )
    }
}
