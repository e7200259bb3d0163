//! HTTP transport for the Engage XML API.
//!
//! Every call is a `POST` of a `text/xml` envelope to a single endpoint. The
//! session encoding handed out at login (for example `;jsessionid=ABC`) is
//! appended to the endpoint path for the duration of that call.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::time::Instant;

use bytes::Bytes;
use reqwest::{Client as HttpClient, header};
use tracing::{debug, warn};
use url::Url;

use crate::config::HttpTransportConfig;
use crate::error::{TransportError, TransportResult, validate_request_size, validate_response_size};
use crate::message::TransportRequest;
use crate::metrics::{AtomicMetrics, TransportMetrics};
use crate::traits::Transport;

const XML_CONTENT_TYPE: &str = "text/xml;charset=UTF-8";

/// Longest slice of an error body kept in [`TransportError::HttpStatus`].
const MAX_ERROR_BODY: usize = 512;

/// reqwest-backed [`Transport`].
pub struct HttpTransport {
    config: HttpTransportConfig,
    endpoint: Url,
    http_client: HttpClient,
    metrics: AtomicMetrics,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeouts", &self.config.timeouts)
            .finish()
    }
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// Fails with [`TransportError::ConfigurationError`] when the URL is not an
    /// absolute `http`/`https` URL or the HTTP client cannot be built.
    pub fn new(config: HttpTransportConfig) -> TransportResult<Self> {
        let endpoint = Url::parse(&config.url)
            .map_err(|e| TransportError::ConfigurationError(format!("invalid URL: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TransportError::ConfigurationError(format!(
                "unsupported URL scheme: {}",
                endpoint.scheme()
            )));
        }

        let mut client_builder = HttpClient::builder()
            .use_rustls_tls()
            .connect_timeout(config.timeouts.connect);

        if let Some(request_timeout) = config.timeouts.request {
            client_builder = client_builder.timeout(request_timeout);
        }

        if let Some(ref user_agent) = config.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        }

        let http_client = client_builder.build()?;

        Ok(Self {
            config,
            endpoint,
            http_client,
            metrics: AtomicMetrics::new(),
        })
    }

    /// Build the URL for one call, splicing the session encoding onto the path.
    fn request_url(&self, session_encoding: Option<&str>) -> String {
        let base = self.endpoint.as_str();
        match session_encoding.filter(|encoding| !encoding.is_empty()) {
            None => base.to_string(),
            Some(encoding) => match base.split_once('?') {
                Some((path, query)) => format!("{path}{encoding}?{query}"),
                None => format!("{base}{encoding}"),
            },
        }
    }

    async fn exchange(&self, request: TransportRequest) -> TransportResult<Bytes> {
        validate_request_size(request.size(), &self.config.limits)?;

        let url = self.request_url(request.session_encoding.as_deref());
        let size = request.size();
        debug!(bytes = size, has_session = request.session_encoding.is_some(), "POST envelope");

        let started = Instant::now();
        let response = self
            .http_client
            .post(&url)
            .header(header::CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(request.body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        self.metrics.requests_sent.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .bytes_sent
            .fetch_add(size as u64, Ordering::Relaxed);

        if let Some(length) = response.content_length() {
            validate_response_size(length as usize, &self.config.limits)?;
        }

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        validate_response_size(body.len(), &self.config.limits)?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let truncated: String = text.chars().take(MAX_ERROR_BODY).collect();
            warn!(status = status.as_u16(), "Engage endpoint returned error status");
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body: truncated,
            });
        }

        self.metrics
            .responses_received
            .fetch_add(1, Ordering::Relaxed);
        self.metrics
            .bytes_received
            .fetch_add(body.len() as u64, Ordering::Relaxed);
        self.metrics
            .update_latency_us(started.elapsed().as_micros() as u64);

        debug!(bytes = body.len(), "Received response");
        Ok(body)
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::RequestTimeout {
                operation: "POST envelope".to_string(),
                timeout: self.config.timeouts.request.unwrap_or_default(),
            }
        } else {
            TransportError::from(err)
        }
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Bytes>> + Send + '_>> {
        Box::pin(async move {
            let result = self.exchange(request).await;
            if result.is_err() {
                self.metrics.failed_requests.fetch_add(1, Ordering::Relaxed);
            }
            result
        })
    }

    fn metrics(&self) -> TransportMetrics {
        self.metrics.snapshot()
    }

    fn endpoint(&self) -> Option<String> {
        Some(self.endpoint.to_string())
    }
}
