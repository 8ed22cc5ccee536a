//! Client configuration and its builder.
//!
//! # Design
//! `ConfigBuilder` is a mutable staging value seeded with defaults; each
//! `with_*` call overrides one field and hands the builder back. `build`
//! resolves the transport chain once and produces a `ClientConfig` that
//! cannot be modified afterwards. Nothing is validated here: a bad host or
//! port surfaces later as a request construction failure.

use std::sync::Arc;
use std::time::Duration;

use crate::logging::LoggingTransport;
use crate::transport::{HttpClient, Transport, UreqTransport};

const DEFAULT_SCHEME: &str = "http";

pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_PORT: &str = "80";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_VERBOSE: bool = false;

/// Immutable settings shared by every account operation.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_version: String,
    host: String,
    port: String,
    http_client: HttpClient,
    verbose_log: bool,
}

impl ClientConfig {
    /// `scheme://host:port/api_version`, without a trailing slash.
    pub fn base_path(&self) -> String {
        format!(
            "{DEFAULT_SCHEME}://{}:{}/{}",
            self.host, self.port, self.api_version
        )
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose_log
    }
}

/// Fluent builder for `ClientConfig`.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    api_version: String,
    host: String,
    port: String,
    http_client: Option<HttpClient>,
    verbose_log: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT.to_string(),
            http_client: None,
            verbose_log: DEFAULT_VERBOSE,
        }
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client instead of the default one. Its timeout
    /// and transport are kept; `verbose` only wraps the transport.
    pub fn with_http_client(mut self, http_client: HttpClient) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn verbose(mut self) -> Self {
        self.verbose_log = true;
        self
    }

    pub fn build(self) -> ClientConfig {
        let http_client = match self.http_client {
            None => default_http_client(DEFAULT_TIMEOUT, self.verbose_log),
            Some(mut client) => {
                if self.verbose_log {
                    enable_verbose_logging(&mut client);
                }
                client
            }
        };

        ClientConfig {
            api_version: self.api_version,
            host: self.host,
            port: self.port,
            http_client,
            verbose_log: self.verbose_log,
        }
    }
}

fn default_http_client(timeout: Duration, verbose: bool) -> HttpClient {
    let client = HttpClient::new().with_timeout(timeout);
    if !verbose {
        return client;
    }
    let transport: Arc<dyn Transport> = Arc::new(UreqTransport::new(Some(timeout)));
    client.with_transport(LoggingTransport::new(transport))
}

/// Wrap the client's transport (or a default one honoring its timeout) in
/// a verbose `LoggingTransport`.
fn enable_verbose_logging(client: &mut HttpClient) {
    let timeout = client.timeout();
    let inner = client
        .take_transport()
        .unwrap_or_else(|| Arc::new(UreqTransport::new(timeout)) as Arc<dyn Transport>);
    client.set_transport(Arc::new(LoggingTransport::new(inner)));
}
