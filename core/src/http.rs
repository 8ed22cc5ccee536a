//! HTTP request and response types exchanged with a `Transport`.
//!
//! # Design
//! Requests are plain data: method, parsed URL, header pairs and an owned
//! body. Because the body is an owned byte buffer it can be inspected any
//! number of times (the logging decorator relies on this) before the
//! transport consumes the request.
//!
//! Response bodies are the opposite: `ResponseBody` is a read-once stream
//! so that transports can hand back the network reader directly. Whoever
//! wants to look at the bytes without stealing them from the next consumer
//! has to buffer them and put a fresh `ResponseBody` back in place.

use std::fmt;
use std::io::{self, Read};

use http::uri::InvalidUri;
use http::Uri;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Methods whose request body is worth tracing.
    pub fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Uri,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Fails when `url` is not a valid absolute or relative URI.
    pub fn new(method: HttpMethod, url: &str) -> Result<Self, InvalidUri> {
        Ok(Self {
            method,
            url: url.parse()?,
            headers: Vec::new(),
            body: None,
        })
    }

    /// Set a header, replacing any earlier value with the same name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A read-once response body stream.
pub struct ResponseBody(Box<dyn Read>);

impl ResponseBody {
    pub fn new(reader: impl Read + 'static) -> Self {
        Self(Box::new(reader))
    }

    pub fn empty() -> Self {
        Self::from(Vec::new())
    }

    /// A body whose first read fails with `err`.
    pub fn failed(err: io::Error) -> Self {
        Self::new(FailedReader(Some(err)))
    }

    /// Drain the stream. The body is exhausted afterwards.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.0.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(io::Cursor::new(bytes))
    }
}

impl From<String> for ResponseBody {
    fn from(body: String) -> Self {
        Self::from(body.into_bytes())
    }
}

impl From<&str> for ResponseBody {
    fn from(body: &str) -> Self {
        Self::from(body.as_bytes().to_vec())
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseBody { .. }")
    }
}

struct FailedReader(Option<io::Error>);

impl Read for FailedReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        match self.0.take() {
            Some(err) => Err(err),
            None => Ok(0),
        }
    }
}

/// An HTTP response as returned by a `Transport`.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<ResponseBody>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Status code followed by its canonical reason phrase, e.g. `201 Created`.
    pub fn status_line(&self) -> String {
        let reason = http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason());
        match reason {
            Some(reason) => format!("{} {reason}", self.status),
            None => self.status.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_parses_url() {
        let url = "http://localhost:80/v1/organisation/accounts";
        let req = HttpRequest::new(HttpMethod::Get, url).unwrap();
        assert_eq!(req.url.host(), Some("localhost"));
        assert_eq!(req.url.path(), "/v1/organisation/accounts");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn new_request_rejects_invalid_url() {
        assert!(HttpRequest::new(HttpMethod::Get, "http://fake:80 /v1").is_err());
    }

    #[test]
    fn with_header_replaces_case_insensitively() {
        let req = HttpRequest::new(HttpMethod::Post, "http://localhost/")
            .unwrap()
            .with_header("Content-Type", "text/plain")
            .with_header("content-type", "application/json");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn body_can_be_read_once() {
        let mut body = ResponseBody::from("hello");
        assert_eq!(body.read_all().unwrap(), b"hello");
        assert!(body.read_all().unwrap().is_empty());
    }

    #[test]
    fn failed_body_reports_error() {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let mut body = ResponseBody::failed(err);
        let err = body.read_all().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn status_line_includes_reason() {
        assert_eq!(HttpResponse::new(201, "").status_line(), "201 Created");
        assert_eq!(HttpResponse::new(599, "").status_line(), "599");
    }

    #[test]
    fn only_post_and_put_carry_body() {
        assert!(HttpMethod::Post.carries_body());
        assert!(HttpMethod::Put.carries_body());
        assert!(!HttpMethod::Get.carries_body());
        assert!(!HttpMethod::Delete.carries_body());
    }
}
