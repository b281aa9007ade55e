//! GraphQL response types, envelope decoding and result assembly.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{PayloadFailure, ResponseError, Result};
use crate::selection::Selection;
use crate::transport::ResponseHead;

/// A location in a GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

/// An error reported by the server in the envelope's `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolError {
    /// The error message.
    pub message: String,

    /// Locations in the document where the error occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
}

impl ProtocolError {
    /// Create an error without locations.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
        }
    }

    /// Add a location.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.locations
            .get_or_insert_with(Vec::new)
            .push(Location { line, column });
        self
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(location) = self.locations.as_ref().and_then(|l| l.first()) {
            write!(f, " (line {}, column {})", location.line, location.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

/// The generic `{ data, errors }` response shape.
///
/// `data` is nullable whatever the selection expects; whether null is
/// acceptable is decided later by the selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "L: DeserializeOwned"))]
pub struct Envelope<L> {
    /// The payload, shaped by the selection's type lock.
    #[serde(default)]
    pub data: Option<L>,
    /// Errors reported alongside (or instead of) the data.
    #[serde(default)]
    pub errors: Option<Vec<ProtocolError>>,
}

/// Which channel produced a result.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOrigin {
    /// An HTTP response, with its status response when known.
    Http(Option<ResponseHead>),
    /// A websocket message.
    Socket,
    /// No transport; the result was built directly (e.g. in tests).
    Absent,
}

/// A successfully decoded GraphQL response.
///
/// Only exists when both the envelope and the selection decoded. Server
/// `errors` are kept even when `data` decoded: partial success is a
/// legitimate outcome.
pub struct GraphQLResult<T, L> {
    data: T,
    response: TransportOrigin,
    errors: Option<Vec<ProtocolError>>,
    _type_lock: PhantomData<fn() -> L>,
}

impl<T, L> GraphQLResult<T, L> {
    /// Build a result directly.
    pub fn new(data: T, response: TransportOrigin, errors: Option<Vec<ProtocolError>>) -> Self {
        Self {
            data,
            response,
            errors,
            _type_lock: PhantomData,
        }
    }

    /// The decoded data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// The channel that produced this result.
    pub fn response(&self) -> &TransportOrigin {
        &self.response
    }

    /// Errors reported by the server, if any.
    pub fn errors(&self) -> Option<&[ProtocolError]> {
        self.errors.as_deref()
    }

    /// Check if the server reported errors.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// Get the first error, if any.
    pub fn first_error(&self) -> Option<&ProtocolError> {
        self.errors.as_ref().and_then(|errors| errors.first())
    }

    /// Get all error messages joined into one string.
    pub fn error_message(&self) -> Option<String> {
        let errors = self.errors.as_ref().filter(|errors| !errors.is_empty())?;
        Some(
            errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Take the decoded data.
    pub fn into_data(self) -> T {
        self.data
    }

    /// Split into data, origin and errors.
    pub fn into_parts(self) -> (T, TransportOrigin, Option<Vec<ProtocolError>>) {
        (self.data, self.response, self.errors)
    }
}

impl<T: Clone, L> Clone for GraphQLResult<T, L> {
    fn clone(&self) -> Self {
        Self::new(self.data.clone(), self.response.clone(), self.errors.clone())
    }
}

impl<T: fmt::Debug, L> fmt::Debug for GraphQLResult<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQLResult")
            .field("data", &self.data)
            .field("response", &self.response)
            .field("errors", &self.errors)
            .finish()
    }
}

impl<T: PartialEq, L: PartialEq> PartialEq for GraphQLResult<T, L> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.response == other.response && self.errors == other.errors
    }
}

/// Decode raw bytes into an envelope.
///
/// Malformed JSON and shape mismatches both become
/// `BadPayload(InvalidEnvelope)` carrying the raw body.
pub fn decode_envelope<L: DeserializeOwned>(bytes: &[u8]) -> Result<Envelope<L>> {
    serde_json::from_slice(bytes).map_err(|err| {
        tracing::debug!(target: "lattice_graphql::response", "Invalid envelope: {}", err);
        ResponseError::BadPayload {
            reason: PayloadFailure::InvalidEnvelope(err.to_string()),
            raw: Some(String::from_utf8_lossy(bytes).into_owned()),
        }
    })
}

/// Feed an envelope through a selection and tag the result with its origin.
pub fn assemble<S>(
    envelope: Envelope<S::TypeLock>,
    selection: &S,
    origin: TransportOrigin,
) -> Result<GraphQLResult<S::Output, S::TypeLock>>
where
    S: Selection + ?Sized,
{
    let Envelope { data, errors } = envelope;
    let data = selection
        .decode(data)
        .map_err(|err| ResponseError::bad_payload(err.into()))?;
    Ok(GraphQLResult::new(data, origin, errors))
}
