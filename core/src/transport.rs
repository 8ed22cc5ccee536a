//! Transports: the "send one request, get one response" capability.
//!
//! # Design
//! `Transport` is the seam between the account operations and the network.
//! `UreqTransport` is the pass-through implementation backed by a blocking
//! `ureq` agent; `LoggingTransport` (see `logging`) decorates any other
//! transport. `HttpClient` is the handle callers inject through the config
//! builder: it pairs an optional timeout with an optional transport and
//! falls back to a `UreqTransport` honoring that timeout.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;

use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};

/// A request could not be delivered or no response came back.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Ureq(#[from] ureq::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn other(message: impl Into<String>) -> Self {
        TransportError::Other(message.into())
    }
}

/// Anything that can perform one HTTP round trip.
///
/// Non-2xx statuses are responses, not errors: only failures to complete
/// the round trip are reported as `TransportError`.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Type name of the concrete transport, for diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// `timeout` bounds the whole round trip; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

fn apply_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.to_string();
        let headers = &request.headers;

        let response = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => apply_headers(self.agent.get(&url), headers).call(),
            (HttpMethod::Delete, _) => apply_headers(self.agent.delete(&url), headers).call(),
            (HttpMethod::Post, Some(body)) => {
                apply_headers(self.agent.post(&url), headers).send(body)
            }
            (HttpMethod::Post, None) => apply_headers(self.agent.post(&url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                apply_headers(self.agent.put(&url), headers).send(body)
            }
            (HttpMethod::Put, None) => apply_headers(self.agent.put(&url), headers).send_empty(),
        }?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = ResponseBody::new(response.into_body().into_reader());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// The HTTP client handle injected into `ClientConfig`.
///
/// The timeout is enforced by the fallback `UreqTransport` only; a custom
/// transport is responsible for its own deadlines.
#[derive(Clone, Default)]
pub struct HttpClient {
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
    fallback: OnceLock<UreqTransport>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The explicitly installed transport, if any.
    pub fn transport(&self) -> Option<&Arc<dyn Transport>> {
        self.transport.as_ref()
    }

    pub(crate) fn take_transport(&mut self) -> Option<Arc<dyn Transport>> {
        self.transport.take()
    }

    pub(crate) fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = Some(transport);
    }

    /// Perform one round trip through the installed or fallback transport.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match &self.transport {
            Some(transport) => transport.send(request),
            None => self
                .fallback
                .get_or_init(|| UreqTransport::new(self.timeout))
                .send(request),
        }
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("timeout", &self.timeout)
            .field("transport", &self.transport.as_ref().map(|t| t.name()))
            .finish()
    }
}
