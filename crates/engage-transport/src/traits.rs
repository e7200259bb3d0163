//! Core transport trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::TransportResult;
use crate::message::TransportRequest;
use crate::metrics::TransportMetrics;

/// A single-shot request/response channel to the Engage endpoint.
///
/// Implementations send one envelope and return the raw body. They must not
/// retry: the remote operations are not guaranteed to be idempotent.
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Sends a request and returns the raw response body.
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Bytes>> + Send + '_>>;

    /// Returns a snapshot of the transport's counters.
    fn metrics(&self) -> TransportMetrics {
        TransportMetrics::default()
    }

    /// Returns the endpoint address or identifier for this transport, if applicable.
    fn endpoint(&self) -> Option<String> {
        None
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Bytes>> + Send + '_>> {
        (**self).send(request)
    }

    fn metrics(&self) -> TransportMetrics {
        (**self).metrics()
    }

    fn endpoint(&self) -> Option<String> {
        (**self).endpoint()
    }
}
