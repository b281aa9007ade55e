//! Error types for the GraphQL pipeline.
//!
//! Every failure surface of a request (bad endpoint, transport failure, HTTP
//! status, undecodable payload, selection decode failure) is reduced to a
//! single [`ResponseError`] variant before it reaches the caller.

use std::mem;

use thiserror::Error;

use crate::selection::SelectionError;
use crate::transport::ResponseHead;

/// Failures raised by a [`Session`](crate::transport::Session) while
/// executing a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The session gave up waiting for the server.
    #[error("request timed out")]
    Timeout,
    /// Connection refused, reset, or failed during TLS/DNS setup.
    #[error("connection error: {0}")]
    Connect(String),
    /// Redirect limit exceeded.
    #[error("too many redirects")]
    TooManyRedirects,
    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
    /// Any other request failure.
    #[error("HTTP request error: {0}")]
    Request(String),
}

impl TransportError {
    /// Check if this error is a session-level timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_redirect() {
            Self::TooManyRedirects
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Why a response payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadFailure {
    /// The transport produced no response metadata at all.
    #[error("response is nil")]
    MissingResponse,
    /// The response metadata is not an HTTP response.
    #[error("response empty or malformed")]
    MalformedResponse,
    /// The response carried no body.
    #[error("response data is empty")]
    EmptyBody,
    /// The body is not a valid `{ data, errors }` envelope.
    #[error("invalid response envelope: {0}")]
    InvalidEnvelope(String),
    /// The envelope decoded, but the selection rejected its `data`.
    #[error("selection failed to decode data: {0}")]
    Selection(String),
    /// A non-null selection received `"data": null`.
    #[error("non-null assumption failed: response data is null")]
    NonNullAssumptionFailed,
}

impl From<SelectionError> for PayloadFailure {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::NullData => Self::NonNullAssumptionFailed,
            SelectionError::Decode(msg) => Self::Selection(msg),
        }
    }
}

/// Terminal outcome of a failed pipeline run.
///
/// Exactly one variant is active per failure. Equality compares the variant
/// kind only: two `BadPayload` errors are equal whatever their reasons. Use
/// [`payload_failure`](Self::payload_failure), [`status`](Self::status) and
/// the `is_*` predicates to inspect details.
#[derive(Debug, Clone, Error)]
pub enum ResponseError {
    /// The endpoint string is not a valid URL. No request was made.
    #[error("invalid endpoint URL: {0}")]
    BadUrl(String),
    /// The session timed out waiting for the server.
    #[error("request timed out")]
    Timeout,
    /// Transport-level failure (DNS, connection reset, TLS).
    #[error("network error: {0}")]
    Network(TransportError),
    /// The response was missing, malformed, or could not be decoded.
    #[error("bad payload: {reason}")]
    BadPayload {
        /// What was wrong with the payload.
        reason: PayloadFailure,
        /// The raw body as lossy UTF-8, when one was received.
        raw: Option<String>,
    },
    /// The server answered with a status outside 200-299.
    #[error("bad status: {reason}")]
    BadStatus {
        /// Human-readable reason, including the status code.
        reason: String,
        /// The status response.
        response: ResponseHead,
    },
    /// The caller cancelled the request before it completed.
    #[error("request was cancelled")]
    Cancelled,
}

impl ResponseError {
    /// Create a `BadPayload` error without a raw body.
    pub fn bad_payload(reason: PayloadFailure) -> Self {
        Self::BadPayload { reason, raw: None }
    }

    /// Create a `BadStatus` error for the given status response.
    pub fn bad_status(response: ResponseHead) -> Self {
        Self::BadStatus {
            reason: format!("server responded with status code {}", response.status),
            response,
        }
    }

    /// The payload failure reason, if this is a `BadPayload` error.
    pub fn payload_failure(&self) -> Option<&PayloadFailure> {
        match self {
            Self::BadPayload { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// The raw response body attached to a `BadPayload` error.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Self::BadPayload { raw, .. } => raw.as_deref(),
            _ => None,
        }
    }

    /// The HTTP status code, if this is a `BadStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadStatus { response, .. } => Some(response.status),
            _ => None,
        }
    }

    /// Check if a non-null selection received null data.
    pub fn is_non_null_failure(&self) -> bool {
        matches!(
            self.payload_failure(),
            Some(PayloadFailure::NonNullAssumptionFailed)
        )
    }

    /// Check if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// Kind-only equality; payloads are ignored.
impl PartialEq for ResponseError {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl Eq for ResponseError {}

impl From<TransportError> for ResponseError {
    fn from(err: TransportError) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}

impl From<url::ParseError> for ResponseError {
    fn from(err: url::ParseError) -> Self {
        Self::BadUrl(err.to_string())
    }
}

/// A specialized Result type for GraphQL pipeline operations.
pub type Result<T> = std::result::Result<T, ResponseError>;
