//! Error types for the account API client.
//!
//! # Design
//! Every failure is a single `AccountError` value tagged with the operation
//! that produced it. The `code` field lives in one of two disjoint ranges:
//! local pipeline failures use the small stable codes of `PipelineFailure`
//! (always below 100), remote failures carry the raw HTTP status returned by
//! the service (always 100 or above). Callers branch on `code()` or
//! `pipeline_failure()` instead of parsing the rendered message.

use std::fmt;

use thiserror::Error;

/// The account operation an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Delete,
    Fetch,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "Create",
            Operation::Delete => "Delete",
            Operation::Fetch => "Fetch",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages of the local request/response pipeline that can fail.
///
/// The numeric codes are part of the public contract and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineFailure {
    MarshallingRequest = 1,
    CreatingRequest = 2,
    InvokingBackend = 3,
    ReadingResponse = 4,
    DecodingErrorResponse = 5,
    DecodingResponse = 6,
}

impl PipelineFailure {
    pub const fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(PipelineFailure::MarshallingRequest),
            2 => Some(PipelineFailure::CreatingRequest),
            3 => Some(PipelineFailure::InvokingBackend),
            4 => Some(PipelineFailure::ReadingResponse),
            5 => Some(PipelineFailure::DecodingErrorResponse),
            6 => Some(PipelineFailure::DecodingResponse),
            _ => None,
        }
    }

    /// Leading text of the message attached to this failure.
    pub fn description(self) -> &'static str {
        match self {
            PipelineFailure::MarshallingRequest => "failed marshalling request",
            PipelineFailure::CreatingRequest => "failed creating request",
            PipelineFailure::InvokingBackend => "failed invoking backend",
            PipelineFailure::ReadingResponse => "failed reading response body",
            PipelineFailure::DecodingErrorResponse => "failed decoding error response",
            PipelineFailure::DecodingResponse => "failed decoding response",
        }
    }
}

/// Errors returned by every `AccountService` operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation}: {code} - {message}")]
pub struct AccountError {
    operation: Operation,
    code: u16,
    message: String,
}

impl AccountError {
    pub fn new(operation: Operation, code: u16, message: impl Into<String>) -> Self {
        Self {
            operation,
            code,
            message: message.into(),
        }
    }

    /// A local pipeline failure; `cause` is appended to the stage description.
    pub fn pipeline(
        operation: Operation,
        failure: PipelineFailure,
        cause: impl fmt::Display,
    ) -> Self {
        Self::new(
            operation,
            failure.code(),
            format!("{}: {cause}", failure.description()),
        )
    }

    /// A failure reported by the remote service with its HTTP status.
    pub fn remote(operation: Operation, status: u16, message: impl Into<String>) -> Self {
        Self::new(operation, status, message)
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the code is an HTTP status from the service.
    pub fn is_remote(&self) -> bool {
        self.code >= 100
    }

    pub fn pipeline_failure(&self) -> Option<PipelineFailure> {
        if self.is_remote() {
            return None;
        }
        PipelineFailure::from_code(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_operation_code_and_message() {
        let err = AccountError::remote(Operation::Create, 409, "id is not a valid uuid");
        assert_eq!(err.to_string(), "Create: 409 - id is not a valid uuid");
    }

    #[test]
    fn renders_empty_message() {
        let err = AccountError::remote(Operation::Delete, 404, "");
        assert_eq!(err.to_string(), "Delete: 404 - ");
    }

    #[test]
    fn accessors_expose_fields() {
        let err = AccountError::new(Operation::Fetch, 500, "boom");
        assert_eq!(err.operation(), Operation::Fetch);
        assert_eq!(err.code(), 500);
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn pipeline_error_prefixes_cause() {
        let failure = PipelineFailure::InvokingBackend;
        let err = AccountError::pipeline(Operation::Delete, failure, "fake error");
        assert_eq!(err.code(), 3);
        assert_eq!(err.message(), "failed invoking backend: fake error");
        assert_eq!(err.to_string(), "Delete: 3 - failed invoking backend: fake error");
    }

    #[test]
    fn pipeline_and_remote_ranges_are_disjoint() {
        let local =
            AccountError::pipeline(Operation::Fetch, PipelineFailure::DecodingResponse, "eof");
        assert!(!local.is_remote());
        assert_eq!(local.pipeline_failure(), Some(PipelineFailure::DecodingResponse));

        let remote = AccountError::remote(Operation::Fetch, 404, "record does not exist");
        assert!(remote.is_remote());
        assert_eq!(remote.pipeline_failure(), None);
    }

    #[test]
    fn pipeline_codes_are_stable() {
        let all = [
            PipelineFailure::MarshallingRequest,
            PipelineFailure::CreatingRequest,
            PipelineFailure::InvokingBackend,
            PipelineFailure::ReadingResponse,
            PipelineFailure::DecodingErrorResponse,
            PipelineFailure::DecodingResponse,
        ];
        for (i, failure) in all.into_iter().enumerate() {
            assert_eq!(failure.code(), i as u16 + 1);
            assert_eq!(PipelineFailure::from_code(failure.code()), Some(failure));
        }
        assert_eq!(PipelineFailure::from_code(0), None);
        assert_eq!(PipelineFailure::from_code(7), None);
    }
}
