//! Decoding GraphQL results from websocket messages.
//!
//! Socket results skip the HTTP half of the pipeline: the message already
//! holds the `{ data, errors }` envelope, so it is decoded once and fed
//! through the selection with [`TransportOrigin::Socket`].
//!
//! Framing, connection management and subscription bookkeeping stay with the
//! caller. This module only needs a message that can decode its payload.
//!
//! ```ignore
//! use lattice_graphql::socket::{NextMessage, decode_socket_message};
//!
//! while let Some(Ok(message)) = stream.next().await {
//!     let next = NextMessage::try_from(&message)?;
//!     let result = decode_socket_message(&next, &selection)?;
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{PayloadFailure, ResponseError, Result};
use crate::response::{Envelope, GraphQLResult, TransportOrigin, assemble};
use crate::selection::Selection;

/// Failure to decode a websocket message payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocketDecodeError {
    /// The frame carries no data (ping, pong, close).
    #[error("unsupported websocket frame: {0}")]
    UnsupportedFrame(&'static str),
    /// The frame is not a graphql-transport-ws `next` message.
    #[error("expected a `next` message, got `{0}`")]
    UnexpectedType(String),
    /// The payload is not valid JSON of the expected shape.
    #[error("invalid message payload: {0}")]
    Json(String),
}

impl From<serde_json::Error> for SocketDecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// A pre-framed message that can decode its payload.
pub trait SocketMessage {
    /// Decode the message payload as `T`.
    fn decode_payload<T: DeserializeOwned>(&self) -> std::result::Result<T, SocketDecodeError>;
}

impl SocketMessage for Message {
    fn decode_payload<T: DeserializeOwned>(&self) -> std::result::Result<T, SocketDecodeError> {
        match self {
            Message::Text(text) => Ok(serde_json::from_str(text.as_str())?),
            Message::Binary(bytes) => Ok(serde_json::from_slice(bytes)?),
            Message::Ping(_) => Err(SocketDecodeError::UnsupportedFrame("ping")),
            Message::Pong(_) => Err(SocketDecodeError::UnsupportedFrame("pong")),
            Message::Close(_) => Err(SocketDecodeError::UnsupportedFrame("close")),
            Message::Frame(_) => Err(SocketDecodeError::UnsupportedFrame("raw frame")),
        }
    }
}

impl SocketMessage for Value {
    fn decode_payload<T: DeserializeOwned>(&self) -> std::result::Result<T, SocketDecodeError> {
        Ok(T::deserialize(self)?)
    }
}

/// A graphql-transport-ws `next` message.
///
/// Its payload is the execution result envelope for subscription `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextMessage {
    /// The subscription this result belongs to.
    pub id: String,
    /// The execution result.
    pub payload: Value,
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    payload: Option<Value>,
}

impl NextMessage {
    /// Parse a `next` message from its JSON text.
    pub fn parse(text: &str) -> std::result::Result<Self, SocketDecodeError> {
        let frame: RawFrame = serde_json::from_str(text)?;
        Self::from_frame(frame)
    }

    fn from_frame(frame: RawFrame) -> std::result::Result<Self, SocketDecodeError> {
        if frame.kind != "next" {
            return Err(SocketDecodeError::UnexpectedType(frame.kind));
        }
        let id = frame
            .id
            .ok_or_else(|| SocketDecodeError::Json("`next` message without id".into()))?;
        let payload = frame
            .payload
            .ok_or_else(|| SocketDecodeError::Json("`next` message without payload".into()))?;
        Ok(Self { id, payload })
    }
}

impl TryFrom<&Message> for NextMessage {
    type Error = SocketDecodeError;

    fn try_from(message: &Message) -> std::result::Result<Self, Self::Error> {
        let frame: RawFrame = message.decode_payload()?;
        Self::from_frame(frame)
    }
}

impl SocketMessage for NextMessage {
    fn decode_payload<T: DeserializeOwned>(&self) -> std::result::Result<T, SocketDecodeError> {
        self.payload.decode_payload()
    }
}

/// Decode a socket message through a selection.
///
/// Payload decode failures become `BadPayload(InvalidEnvelope)`; selection
/// failures are reported exactly as on the HTTP path.
pub fn decode_socket_message<M, S>(
    message: &M,
    selection: &S,
) -> Result<GraphQLResult<S::Output, S::TypeLock>>
where
    M: SocketMessage + ?Sized,
    S: Selection + ?Sized,
{
    let envelope: Envelope<S::TypeLock> = message.decode_payload().map_err(|err| {
        tracing::debug!(target: "lattice_graphql::socket", "Invalid socket payload: {}", err);
        ResponseError::bad_payload(PayloadFailure::InvalidEnvelope(err.to_string()))
    })?;
    assemble(envelope, selection, TransportOrigin::Socket)
}
