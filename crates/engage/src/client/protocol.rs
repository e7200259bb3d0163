//! Query/response protocol.
//!
//! Wraps a request body in the envelope, attaches the session encoding as
//! call metadata, sends it through the transport and interprets the reply
//! once. Nothing here retries.

use engage_transport::{Transport, TransportRequest};
use tracing::debug;

use super::core::EngageClient;
use crate::error::{EngageError, Result};
use crate::payload::RequestBody;
use crate::response::Response;

/// Envelope-level sender shared by every client operation.
#[derive(Debug)]
pub(super) struct ProtocolClient<T: Transport> {
    transport: T,
}

impl<T: Transport> ProtocolClient<T> {
    pub(super) fn new(transport: T) -> Self {
        Self { transport }
    }

    pub(super) fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one request. Remote failures come back as an unsuccessful
    /// [`Response`]; only transport failures are errors.
    pub(super) async fn send(
        &self,
        body: RequestBody,
        session_encoding: Option<String>,
    ) -> Result<Response> {
        let operation = body.operation();
        let mut request = TransportRequest::new(body.to_envelope());
        if let Some(encoding) = session_encoding {
            request = request.with_session_encoding(encoding);
        }

        debug!(operation, bytes = request.size(), "sending request");
        let raw = self.transport.send(request).await?;
        let response = Response::parse(raw);

        if !response.is_success() {
            debug!(
                operation,
                fault = %response.error_message().unwrap_or_default(),
                "request failed"
            );
        }
        Ok(response)
    }
}

impl<T: Transport + 'static> EngageClient<T> {
    /// Send a request in the current session and require success.
    ///
    /// A response with `SUCCESS` other than true becomes
    /// [`EngageError::RemoteOperation`] carrying the fault text.
    ///
    /// Unlike a bare envelope post, nothing is sent without a session: the
    /// call fails with [`EngageError::NotLoggedIn`] instead of reaching the
    /// server without a session encoding. Log in first.
    pub async fn execute(&self, body: RequestBody) -> Result<Response> {
        let operation = body.operation();
        let response = self.execute_unchecked(body).await?;
        match response.error_message() {
            None => Ok(response),
            Some(fault) => Err(EngageError::RemoteOperation {
                operation: operation.to_string(),
                fault,
            }),
        }
    }

    /// Send a request in the current session and return the response whether
    /// or not the server reported success.
    ///
    /// Fails with [`EngageError::NotLoggedIn`] before touching the network
    /// when no session is held.
    pub async fn execute_unchecked(&self, body: RequestBody) -> Result<Response> {
        let encoding = self
            .inner
            .session
            .encoding()
            .ok_or_else(|| EngageError::NotLoggedIn {
                operation: body.operation().to_string(),
            })?;
        self.inner.protocol.send(body, Some(encoding)).await
    }
}
