//! Transport abstraction.
//!
//! A [`Session`] executes one [`RequestDescriptor`] and reports what came back
//! as a [`TransportOutcome`]: optional body bytes, optional response metadata
//! and an optional transport error. The pipeline never inspects anything else,
//! so tests can substitute an in-memory session for the network.
//!
//! [`HttpSession`] is the production implementation, backed by `reqwest`.

mod http_session;

use bytes::Bytes;
use futures_util::future::BoxFuture;

pub use self::http_session::{HttpSession, HttpSessionBuilder, HttpSessionConfig, SessionBuildError};
use crate::error::TransportError;
use crate::request::RequestDescriptor;

/// Executes requests on behalf of the pipeline.
///
/// Implementations perform exactly one network operation per call and never
/// retry. Timeouts, pooling and TLS are the session's own business.
pub trait Session: Send + Sync {
    /// Execute a request.
    fn execute(&self, request: RequestDescriptor) -> BoxFuture<'_, TransportOutcome>;
}

/// The status line and headers of an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseHead {
    /// The HTTP status code.
    pub status: u16,
    /// The final URL after redirects, if known.
    pub url: Option<String>,
    /// Response headers.
    pub headers: http::HeaderMap,
}

impl ResponseHead {
    /// Create a response head with the given status and no headers.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            url: None,
            headers: http::HeaderMap::new(),
        }
    }

    /// Set the response URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::try_from(name),
            http::HeaderValue::try_from(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Check if the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Check if the response is a client error (4xx status).
    pub fn is_client_error(&self) -> bool {
        (400..=499).contains(&self.status)
    }

    /// Check if the response is a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..=599).contains(&self.status)
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    pub(crate) fn from_reqwest(response: &reqwest::Response) -> Self {
        Self {
            status: response.status().as_u16(),
            url: Some(response.url().to_string()),
            headers: response.headers().clone(),
        }
    }
}

/// Response metadata reported by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseMeta {
    /// An HTTP response.
    Http(ResponseHead),
    /// Metadata the session could not express as an HTTP response.
    Unrecognized(String),
}

/// Everything a session observed while executing a request.
///
/// Any combination of fields may be present; the classifier decides which
/// one wins.
#[derive(Debug, Clone, Default)]
pub struct TransportOutcome {
    /// Body bytes, if any were received.
    pub body: Option<Bytes>,
    /// Response metadata, if any was received.
    pub response: Option<ResponseMeta>,
    /// Transport-level failure, if one occurred.
    pub error: Option<TransportError>,
}

impl TransportOutcome {
    /// An HTTP response with a body.
    pub fn completed(head: ResponseHead, body: impl Into<Bytes>) -> Self {
        Self {
            body: Some(body.into()),
            response: Some(ResponseMeta::Http(head)),
            error: None,
        }
    }

    /// A transport failure with no response.
    pub fn failed(error: TransportError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ranges() {
        assert!(ResponseHead::new(200).is_success());
        assert!(ResponseHead::new(299).is_success());
        assert!(!ResponseHead::new(300).is_success());
        assert!(!ResponseHead::new(199).is_success());
        assert!(ResponseHead::new(404).is_client_error());
        assert!(ResponseHead::new(502).is_server_error());
    }

    #[test]
    fn test_header_lookup() {
        let head = ResponseHead::new(200)
            .with_url("https://api.example.com/graphql")
            .with_header("Content-Type", "application/json");

        assert_eq!(head.header("content-type"), Some("application/json"));
        assert_eq!(head.header("x-missing"), None);
        assert_eq!(head.url.as_deref(), Some("https://api.example.com/graphql"));
    }

    #[test]
    fn test_outcome_constructors() {
        let outcome = TransportOutcome::completed(ResponseHead::new(200), "{}");
        assert_eq!(outcome.body.as_deref(), Some(b"{}".as_slice()));
        assert!(outcome.error.is_none());

        let outcome = TransportOutcome::failed(TransportError::Timeout);
        assert!(outcome.body.is_none());
        assert!(outcome.response.is_none());
        assert_eq!(outcome.error, Some(TransportError::Timeout));
    }
}
