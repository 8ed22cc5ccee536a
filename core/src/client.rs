//! Account operations against the remote account service.
//!
//! # Design
//! `AccountService` holds only its `ClientConfig` and carries no mutable
//! state between calls, so one instance can serve concurrent callers. Each
//! operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`;
//! the `*_account` methods glue the two together around one round trip
//! through the configured `HttpClient`. Hosts that perform their own I/O can
//! call the halves directly and still get identical status handling.
//!
//! Every exit path reports exactly one `AccountError` tagged with the
//! operation. The response body is always drained before the status is
//! interpreted and is dropped when `parse_*` returns.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{AccountError, Operation, PipelineFailure};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, FetchRequest, FetchResponse,
    ResponseError, ResponseObject,
};

pub const ACCOUNTS_PATH: &str = "/organisation/accounts";
pub const DATE_HEADER: &str = "Date";
pub const ACCEPT_HEADER: &str = "Accept";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";
pub const APPLICATION_JSON: &str = "application/json";

const STATUS_OK: u16 = 200;
const STATUS_CREATED: u16 = 201;
const STATUS_NO_CONTENT: u16 = 204;
const STATUS_NOT_FOUND: u16 = 404;
const MIN_HTTP_STATUS: u16 = 100;

/// The three account operations, for callers that want to swap in a fake.
pub trait AccountManagement {
    fn create_account(&self, request: &CreateRequest) -> Result<CreateResponse, AccountError>;
    fn delete_account(&self, request: &DeleteRequest) -> Result<DeleteResponse, AccountError>;
    fn fetch_account(&self, request: &FetchRequest) -> Result<FetchResponse, AccountError>;
}

/// Blocking client for the account API.
#[derive(Debug, Clone)]
pub struct AccountService {
    config: ClientConfig,
}

impl AccountService {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn accounts_url(&self) -> String {
        format!("{}{ACCOUNTS_PATH}", self.config.base_path())
    }

    pub fn build_create_account(&self, input: &CreateRequest) -> Result<HttpRequest, AccountError> {
        let op = Operation::Create;
        let body = serde_json::to_vec(input)
            .map_err(|e| pipeline(op, PipelineFailure::MarshallingRequest, e))?;
        let request = HttpRequest::new(HttpMethod::Post, &self.accounts_url())
            .map_err(|e| pipeline(op, PipelineFailure::CreatingRequest, e))?;
        Ok(request
            .with_header(DATE_HEADER, now())
            .with_header(CONTENT_TYPE_HEADER, APPLICATION_JSON)
            .with_body(body))
    }

    pub fn build_delete_account(&self, input: &DeleteRequest) -> Result<HttpRequest, AccountError> {
        let url = format!(
            "{}/{}?version={}",
            self.accounts_url(),
            input.account_id,
            input.version
        );
        let request = HttpRequest::new(HttpMethod::Delete, &url)
            .map_err(|e| pipeline(Operation::Delete, PipelineFailure::CreatingRequest, e))?;
        Ok(request.with_header(DATE_HEADER, now()))
    }

    pub fn build_fetch_account(&self, input: &FetchRequest) -> Result<HttpRequest, AccountError> {
        let url = format!("{}/{}", self.accounts_url(), input.account_id);
        let request = HttpRequest::new(HttpMethod::Get, &url)
            .map_err(|e| pipeline(Operation::Fetch, PipelineFailure::CreatingRequest, e))?;
        Ok(request
            .with_header(DATE_HEADER, now())
            .with_header(ACCEPT_HEADER, JSON_API_MEDIA_TYPE))
    }

    /// 201 yields the created resource; anything else is a remote error.
    pub fn parse_create_account(
        &self,
        response: HttpResponse,
    ) -> Result<CreateResponse, AccountError> {
        let op = Operation::Create;
        let (status, body) = drain(op, response)?;
        if status != STATUS_CREATED {
            return Err(remote_error(op, status, &body));
        }
        Ok(CreateResponse {
            body: decode_success(op, &body)?,
            status_code: status,
        })
    }

    /// 204 is success. 404 comes without a body and is reported with an
    /// empty message; any other status carries an error body.
    pub fn parse_delete_account(
        &self,
        response: HttpResponse,
    ) -> Result<DeleteResponse, AccountError> {
        let op = Operation::Delete;
        let (status, body) = drain(op, response)?;
        match status {
            STATUS_NO_CONTENT => Ok(DeleteResponse {
                status_code: status,
            }),
            STATUS_NOT_FOUND => Err(failed(AccountError::remote(op, status, ""))),
            _ => Err(remote_error(op, status, &body)),
        }
    }

    /// 200 yields the stored resource; anything else is a remote error.
    pub fn parse_fetch_account(
        &self,
        response: HttpResponse,
    ) -> Result<FetchResponse, AccountError> {
        let op = Operation::Fetch;
        let (status, body) = drain(op, response)?;
        if status != STATUS_OK {
            return Err(remote_error(op, status, &body));
        }
        Ok(FetchResponse {
            body: decode_success(op, &body)?,
            status_code: status,
        })
    }

    fn execute(&self, op: Operation, request: HttpRequest) -> Result<HttpResponse, AccountError> {
        self.config
            .http_client()
            .send(request)
            .map_err(|e| pipeline(op, PipelineFailure::InvokingBackend, e))
    }
}

impl AccountManagement for AccountService {
    fn create_account(&self, request: &CreateRequest) -> Result<CreateResponse, AccountError> {
        let req = self.build_create_account(request)?;
        let res = self.execute(Operation::Create, req)?;
        self.parse_create_account(res)
    }

    fn delete_account(&self, request: &DeleteRequest) -> Result<DeleteResponse, AccountError> {
        let req = self.build_delete_account(request)?;
        let res = self.execute(Operation::Delete, req)?;
        self.parse_delete_account(res)
    }

    fn fetch_account(&self, request: &FetchRequest) -> Result<FetchResponse, AccountError> {
        let req = self.build_fetch_account(request)?;
        let res = self.execute(Operation::Fetch, req)?;
        self.parse_fetch_account(res)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Read the whole body; the response (and its stream) is dropped here.
///
/// A status below 100 never came from the service, so it is reported as a
/// backend invocation failure rather than a remote error.
fn drain(op: Operation, mut response: HttpResponse) -> Result<(u16, Vec<u8>), AccountError> {
    let body = response
        .body
        .read_all()
        .map_err(|e| pipeline(op, PipelineFailure::ReadingResponse, e))?;
    if response.status < MIN_HTTP_STATUS {
        let cause = format!("invalid status code {}", response.status);
        return Err(pipeline(op, PipelineFailure::InvokingBackend, cause));
    }
    Ok((response.status, body))
}

fn remote_error(op: Operation, status: u16, body: &[u8]) -> AccountError {
    match decode::<ResponseError>(body) {
        Ok(err) => failed(AccountError::remote(op, status, err.error_message)),
        Err(e) => pipeline(op, PipelineFailure::DecodingErrorResponse, e),
    }
}

fn decode_success(op: Operation, body: &[u8]) -> Result<ResponseObject, AccountError> {
    decode(body).map_err(|e| pipeline(op, PipelineFailure::DecodingResponse, e))
}

/// A JSON `null` body decodes to the default record.
fn decode<T: DeserializeOwned + Default>(body: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice::<Option<T>>(body).map(Option::unwrap_or_default)
}

fn pipeline(op: Operation, failure: PipelineFailure, cause: impl fmt::Display) -> AccountError {
    failed(AccountError::pipeline(op, failure, cause))
}

fn failed(err: AccountError) -> AccountError {
    tracing::debug!(operation = %err.operation(), code = err.code(), "account request failed");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    fn service() -> AccountService {
        AccountService::new(ConfigBuilder::new().with_host("fake").build())
    }

    #[test]
    fn build_create_account_produces_correct_request() {
        let req = service().build_create_account(&CreateRequest::default()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url.to_string(), "http://fake:80/v1/organisation/accounts");
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        let date = req.header("Date").unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(date).is_ok());
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["data"]["type"], "");
    }

    #[test]
    fn build_delete_account_puts_version_in_query() {
        let input = DeleteRequest {
            account_id: "ebb084cb-5cb7-49b5-b61c-ea0f7036e4b6".to_string(),
            version: 3,
        };
        let req = service().build_delete_account(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(
            req.url.to_string(),
            "http://fake:80/v1/organisation/accounts/ebb084cb-5cb7-49b5-b61c-ea0f7036e4b6?version=3"
        );
        assert!(req.header("Date").is_some());
        assert!(req.body.is_none());
    }

    #[test]
    fn build_fetch_account_sets_accept() {
        let input = FetchRequest {
            account_id: "abc".to_string(),
        };
        let req = service().build_fetch_account(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url.to_string(), "http://fake:80/v1/organisation/accounts/abc");
        assert_eq!(req.header("Accept"), Some("application/vnd.api+json"));
        assert!(req.header("Content-Type").is_none());
    }

    #[test]
    fn invalid_port_fails_request_construction() {
        let config = ConfigBuilder::new().with_host("fake").with_port("80 ").build();
        let service = AccountService::new(config);
        let err = service.build_fetch_account(&FetchRequest::default()).unwrap_err();
        assert_eq!(err.code(), 2);
        assert_eq!(err.operation(), Operation::Fetch);
        assert!(err.to_string().contains("2 - failed creating request"));
    }

    #[test]
    fn parse_delete_account_success() {
        let res = service().parse_delete_account(HttpResponse::new(204, "")).unwrap();
        assert_eq!(res.status_code, 204);
    }

    #[test]
    fn parse_delete_account_not_found_skips_decoding() {
        let err = service().parse_delete_account(HttpResponse::new(404, "EOF")).unwrap_err();
        assert_eq!(err.code(), 404);
        assert_eq!(err.message(), "");
        assert_eq!(err.to_string(), "Delete: 404 - ");
    }

    #[test]
    fn parse_fetch_account_decode_failure_is_tagged_fetch() {
        let err = service().parse_fetch_account(HttpResponse::new(200, "EOF")).unwrap_err();
        assert_eq!(err.code(), 6);
        assert_eq!(err.operation(), Operation::Fetch);
    }

    #[test]
    fn parse_create_account_remote_error() {
        let res = HttpResponse::new(409, r#"{"error_message":"id is not a valid uuid"}"#);
        let err = service().parse_create_account(res).unwrap_err();
        assert_eq!(err.to_string(), "Create: 409 - id is not a valid uuid");
        assert!(err.is_remote());
    }
}
