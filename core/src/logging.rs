//! Verbose request/response tracing as a transport decorator.
//!
//! # Design
//! `LoggingTransport` wraps another `Transport` and is itself a `Transport`,
//! so decorators chain by composition. Tracing never changes the outcome of
//! the wrapped call: errors pass through untouched, and the response body is
//! buffered per call and handed downstream as a fresh stream that starts at
//! the first byte.
//!
//! Events go to the `tracing` target `accountapi::transport` at INFO level.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};

use crate::http::{HttpRequest, HttpResponse, ResponseBody};
use crate::transport::{Transport, TransportError};

const TARGET: &str = "accountapi::transport";

/// Transport decorator that traces every round trip when verbose.
#[derive(Clone)]
pub struct LoggingTransport {
    inner: Arc<dyn Transport>,
    verbose: bool,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self::with_verbosity(inner, true)
    }

    /// With `verbose` false the decorator is a plain pass-through.
    pub fn with_verbosity(inner: Arc<dyn Transport>, verbose: bool) -> Self {
        Self { inner, verbose }
    }

    pub fn inner(&self) -> &Arc<dyn Transport> {
        &self.inner
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn trace_request(request: &HttpRequest) {
    tracing::info!(target: TARGET, at = %now(), method = %request.method, "Method");
    tracing::info!(target: TARGET, at = %now(), url = %request.url, "URL");
    tracing::info!(target: TARGET, at = %now(), headers = ?request.headers, "Request Headers");

    if request.method.carries_body() {
        let body = request.body.as_deref().unwrap_or_default();
        tracing::info!(
            target: TARGET,
            at = %now(),
            body = %String::from_utf8_lossy(body),
            "Request Body"
        );
    }
}

fn trace_response(response: &mut HttpResponse) {
    tracing::info!(target: TARGET, at = %now(), status = %response.status_line(), "StatusCode");
    tracing::info!(target: TARGET, at = %now(), headers = ?response.headers, "Response Headers");

    let body = match response.body.read_all() {
        Ok(bytes) => {
            tracing::info!(
                target: TARGET,
                at = %now(),
                body = %String::from_utf8_lossy(&bytes),
                "Response Body"
            );
            ResponseBody::from(bytes)
        }
        Err(err) => {
            tracing::warn!(target: TARGET, at = %now(), error = %err, "response body unreadable");
            ResponseBody::failed(err)
        }
    };
    response.body = body;
}

impl Transport for LoggingTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if !self.verbose {
            return self.inner.send(request);
        }

        trace_request(&request);
        let mut response = self.inner.send(request)?;
        trace_response(&mut response);
        Ok(response)
    }
}
