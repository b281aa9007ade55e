//! Typed GraphQL request/response pipeline.
//!
//! This crate turns a typed [`Selection`] into a wire request, sends it over
//! a pluggable [`Session`], and turns the raw response back into a typed
//! [`GraphQLResult`] or a classified [`ResponseError`]:
//!
//! - **Selections**: typed descriptions of what to fetch and how to decode it,
//!   in nullable and [`NonNull`] flavors
//! - **Sessions**: an injectable transport; [`HttpSession`] is the default
//! - **Classification**: transport, status and payload failures reduced to one
//!   error type
//! - **Socket hook**: decode websocket messages through the same selections
//!
//! The pipeline holds no state between calls: no client object, no cache, no
//! retries.
//!
//! # Fetching
//!
//! ```ignore
//! use lattice_graphql::{Document, SendOptions, fetch_non_null};
//!
//! #[derive(serde::Deserialize)]
//! struct Data {
//!     hero: Hero,
//! }
//!
//! let selection = Document::<Data>::query("query Hero($id: ID!) { hero(id: $id) { name } }")
//!     .variable("id", "1000");
//!
//! let result = fetch_non_null(
//!     &selection,
//!     "https://api.example.com/graphql",
//!     SendOptions::new().bearer_auth("token").operation_name("Hero"),
//! )
//! .await?;
//!
//! println!("{}", result.data().hero.name);
//! if let Some(message) = result.error_message() {
//!     // Partial success: data decoded, but the server reported errors too
//!     println!("warnings: {message}");
//! }
//! ```
//!
//! # Callbacks and Cancellation
//!
//! ```ignore
//! use lattice_graphql::{Document, SendOptions, send};
//!
//! let handle = send(
//!     Document::<String>::query("{ hello }"),
//!     "https://api.example.com/graphql",
//!     SendOptions::new(),
//!     |result| match result {
//!         Ok(result) => println!("{:?}", result.data()),
//!         Err(err) => eprintln!("request failed: {err}"),
//!     },
//! );
//!
//! // Cancel if needed; the callback then receives `ResponseError::Cancelled`
//! if let Some(handle) = handle {
//!     handle.cancel();
//! }
//! ```
//!
//! # Errors
//!
//! ```ignore
//! use lattice_graphql::{PayloadFailure, ResponseError};
//!
//! match fetch_non_null(&selection, url, SendOptions::new()).await {
//!     Ok(result) => { /* ... */ }
//!     Err(ResponseError::BadStatus { response, .. }) => {
//!         println!("server answered {}", response.status);
//!     }
//!     Err(err) if err.is_non_null_failure() => {
//!         println!("server sent null data");
//!     }
//!     Err(err) => println!("{err}"),
//! }
//! ```

pub mod classify;
mod error;
mod handle;
pub mod request;
pub mod response;
pub mod selection;
mod send;
pub mod socket;
pub mod transport;

pub use error::{PayloadFailure, ResponseError, Result, TransportError};
pub use handle::{RequestHandle, RequestId, runtime};
pub use request::{GraphQLRequest, HttpMethod, OperationType, RequestDescriptor};
pub use response::{
    Envelope, GraphQLResult, Location, ProtocolError, TransportOrigin, assemble, decode_envelope,
};
pub use selection::{Document, NonNull, Selection, SelectionError};
pub use send::{SendOptions, fetch, fetch_non_null, send, send_non_null};
pub use socket::{NextMessage, SocketDecodeError, SocketMessage, decode_socket_message};
pub use transport::{
    HttpSession, HttpSessionBuilder, HttpSessionConfig, ResponseHead, ResponseMeta, Session,
    SessionBuildError, TransportOutcome,
};
