//! Blocking client library for the account management API.
//!
//! # Overview
//! Assemble a `ClientConfig` with `ConfigBuilder`, hand it to an
//! `AccountService`, and call `create_account`, `delete_account` or
//! `fetch_account`. Each call performs exactly one round trip through the
//! configured `HttpClient` and returns either a typed response or an
//! `AccountError` carrying the operation, a code and a message.
//!
//! # Design
//! - `Transport` is the network seam. `UreqTransport` does real I/O,
//!   `LoggingTransport` decorates any transport with verbose tracing.
//! - Error codes below 100 are local pipeline failures with stable values;
//!   codes of 100 and above are HTTP statuses returned by the service.
//! - No retries, no authentication: inject a preconfigured `HttpClient`
//!   (or a custom `Transport`) for that.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod transport;
pub mod types;

pub use client::{AccountManagement, AccountService};
pub use config::{ClientConfig, ConfigBuilder};
pub use error::{AccountError, Operation, PipelineFailure};
pub use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};
pub use logging::LoggingTransport;
pub use transport::{HttpClient, Transport, TransportError, UreqTransport};
pub use types::{
    AccountAttributes, AccountData, CreateRequest, CreateResponse, DeleteRequest, DeleteResponse,
    FetchRequest, FetchResponse, Link, ResponseData, ResponseError, ResponseObject,
};
