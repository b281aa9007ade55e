//! Response classification.
//!
//! Turns a raw [`TransportOutcome`] into either a body worth decoding or a
//! terminal [`ResponseError`]. The rules are checked in a fixed order because
//! a transport error and a missing response can be reported together:
//!
//! 1. transport error: `Network` (or `Timeout` for session timeouts)
//! 2. no response metadata: `BadPayload(MissingResponse)`
//! 3. non-HTTP metadata: `BadPayload(MalformedResponse)`
//! 4. status outside 200-299: `BadStatus`
//! 5. no body: `BadPayload(EmptyBody)`
//! 6. otherwise: proceed

use bytes::Bytes;

use crate::error::{PayloadFailure, ResponseError};
use crate::transport::{ResponseHead, ResponseMeta, TransportOutcome};

/// Result of classifying a transport outcome.
#[derive(Debug, Clone)]
pub enum Classified {
    /// The response is a 2xx with a body; decode it.
    Proceed {
        /// The response body.
        body: Bytes,
        /// The status response the body arrived with.
        head: ResponseHead,
    },
    /// The request failed; no decoding is attempted.
    Fail(ResponseError),
}

/// Classify what a session reported.
pub fn classify(outcome: TransportOutcome) -> Classified {
    let TransportOutcome {
        body,
        response,
        error,
    } = outcome;

    if let Some(error) = error {
        tracing::debug!(target: "lattice_graphql::classify", "Transport error: {}", error);
        return Classified::Fail(error.into());
    }

    let head = match response {
        None => {
            return Classified::Fail(ResponseError::bad_payload(
                PayloadFailure::MissingResponse,
            ));
        }
        Some(ResponseMeta::Unrecognized(description)) => {
            tracing::debug!(target: "lattice_graphql::classify", "Unrecognized response: {}", description);
            return Classified::Fail(ResponseError::bad_payload(
                PayloadFailure::MalformedResponse,
            ));
        }
        Some(ResponseMeta::Http(head)) => head,
    };

    if !head.is_success() {
        tracing::debug!(target: "lattice_graphql::classify", "Rejecting status {}", head.status);
        return Classified::Fail(ResponseError::bad_status(head));
    }

    match body {
        Some(body) => Classified::Proceed { body, head },
        None => Classified::Fail(ResponseError::bad_payload(PayloadFailure::EmptyBody)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    fn failure(outcome: TransportOutcome) -> ResponseError {
        match classify(outcome) {
            Classified::Fail(err) => err,
            Classified::Proceed { .. } => panic!("Expected failure"),
        }
    }

    #[test]
    fn test_transport_error_wins_over_missing_response() {
        let err = failure(TransportOutcome::failed(TransportError::Connect(
            "reset".into(),
        )));
        assert!(matches!(err, ResponseError::Network(TransportError::Connect(_))));
    }

    #[test]
    fn test_transport_error_wins_over_good_response() {
        let outcome = TransportOutcome {
            error: Some(TransportError::Body("truncated".into())),
            ..TransportOutcome::completed(ResponseHead::new(200), "{}")
        };
        assert!(matches!(failure(outcome), ResponseError::Network(_)));
    }

    #[test]
    fn test_timeout() {
        let err = failure(TransportOutcome::failed(TransportError::Timeout));
        assert_eq!(err, ResponseError::Timeout);
    }

    #[test]
    fn test_missing_response() {
        let err = failure(TransportOutcome::default());
        assert_eq!(err.payload_failure(), Some(&PayloadFailure::MissingResponse));
        assert_eq!(err.to_string(), "bad payload: response is nil");
    }

    #[test]
    fn test_unrecognized_response() {
        let outcome = TransportOutcome {
            body: Some(Bytes::from_static(b"{}")),
            response: Some(ResponseMeta::Unrecognized("ftp".into())),
            error: None,
        };
        assert_eq!(
            failure(outcome).payload_failure(),
            Some(&PayloadFailure::MalformedResponse)
        );
    }

    #[test]
    fn test_bad_status_boundaries() {
        for status in [100, 199, 300, 301, 404, 500, 503] {
            let err = failure(TransportOutcome::completed(
                ResponseHead::new(status),
                r#"{"data": "ok"}"#,
            ));
            assert_eq!(err.status(), Some(status));
            assert!(err.to_string().contains(&status.to_string()));
        }
        for status in [200, 204, 299] {
            let outcome = TransportOutcome::completed(ResponseHead::new(status), "{}");
            assert!(matches!(classify(outcome), Classified::Proceed { .. }));
        }
    }

    #[test]
    fn test_bad_status_checked_before_body() {
        let outcome = TransportOutcome {
            body: None,
            response: Some(ResponseMeta::Http(ResponseHead::new(500))),
            error: None,
        };
        assert_eq!(failure(outcome).status(), Some(500));
    }

    #[test]
    fn test_empty_body() {
        let outcome = TransportOutcome {
            body: None,
            response: Some(ResponseMeta::Http(ResponseHead::new(200))),
            error: None,
        };
        assert_eq!(
            failure(outcome).payload_failure(),
            Some(&PayloadFailure::EmptyBody)
        );
    }

    #[test]
    fn test_proceed_keeps_head_and_body() {
        let head = ResponseHead::new(200).with_header("x-request-id", "abc");
        match classify(TransportOutcome::completed(head.clone(), "{}")) {
            Classified::Proceed { body, head: got } => {
                assert_eq!(&body[..], b"{}");
                assert_eq!(got, head);
            }
            Classified::Fail(err) => panic!("Unexpected failure: {err}"),
        }
    }
}
