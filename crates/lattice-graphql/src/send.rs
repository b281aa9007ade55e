//! Public entry points that run the request pipeline.
//!
//! [`fetch`] runs the pipeline inline and returns its result. [`send`] spawns
//! it and reports through a completion callback, returning a
//! [`RequestHandle`] for cancellation. Both have `_non_null` variants that
//! wrap a nullable selection in [`NonNull`] first.

use std::sync::{Arc, OnceLock};

use url::Url;

use crate::classify::{Classified, classify};
use crate::error::{ResponseError, Result};
use crate::handle::{RequestHandle, RequestId, runtime};
use crate::request::{HttpMethod, RequestDescriptor};
use crate::response::{GraphQLResult, TransportOrigin, assemble, decode_envelope};
use crate::selection::{NonNull, Selection};
use crate::transport::{HttpSession, Session};

/// Per-request options.
///
/// Defaults: POST, no extra headers, no operation name, and a shared
/// [`HttpSession`] with default configuration.
#[derive(Clone, Default)]
pub struct SendOptions {
    operation_name: Option<String>,
    headers: Vec<(String, String)>,
    method: HttpMethod,
    session: Option<Arc<dyn Session>>,
}

impl SendOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operation name sent with the payload.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Add a header. A later header with the same name replaces it.
    ///
    /// `Content-Type` cannot be overridden.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add multiple headers.
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set bearer token authentication.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header("Authorization", value)
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Use a specific session instead of the shared default.
    pub fn session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    fn session_or_default(&self) -> Arc<dyn Session> {
        match &self.session {
            Some(session) => Arc::clone(session),
            None => default_session(),
        }
    }
}

impl std::fmt::Debug for SendOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("SendOptions")
            .field("operation_name", &self.operation_name)
            .field("headers", &header_names)
            .field("method", &self.method)
            .field("custom_session", &self.session.is_some())
            .finish()
    }
}

fn default_session() -> Arc<dyn Session> {
    static DEFAULT: OnceLock<Arc<HttpSession>> = OnceLock::new();
    DEFAULT.get_or_init(|| Arc::new(HttpSession::new())).clone()
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    Url::parse(endpoint).map_err(|err| {
        tracing::warn!(target: "lattice_graphql::send", "Invalid endpoint '{}': {}", endpoint, err);
        ResponseError::from(err)
    })
}

async fn execute<S>(
    selection: &S,
    url: Url,
    options: &SendOptions,
) -> Result<GraphQLResult<S::Output, S::TypeLock>>
where
    S: Selection + ?Sized,
{
    let descriptor = RequestDescriptor::build(
        &selection.payload(options.operation_name.as_deref()),
        url,
        &options.headers,
        options.method,
    );

    let session = options.session_or_default();
    let outcome = session.execute(descriptor).await;

    match classify(outcome) {
        Classified::Proceed { body, head } => {
            let envelope = decode_envelope::<S::TypeLock>(&body)?;
            assemble(envelope, selection, TransportOrigin::Http(Some(head)))
        }
        Classified::Fail(err) => Err(err),
    }
}

/// Run the pipeline for a selection and wait for the result.
///
/// # Example
///
/// ```ignore
/// use lattice_graphql::{Document, SendOptions, fetch};
///
/// let hello = Document::<String>::query("{ hello }");
/// let result = fetch(&hello, "https://api.example.com/graphql", SendOptions::new()).await?;
/// println!("{:?}", result.data());
/// ```
pub async fn fetch<S>(
    selection: &S,
    endpoint: &str,
    options: SendOptions,
) -> Result<GraphQLResult<S::Output, S::TypeLock>>
where
    S: Selection + ?Sized,
{
    let url = parse_endpoint(endpoint)?;
    execute(selection, url, &options).await
}

/// Like [`fetch`], but null data is an error instead of `None`.
pub async fn fetch_non_null<S, T>(
    selection: &S,
    endpoint: &str,
    options: SendOptions,
) -> Result<GraphQLResult<T, S::TypeLock>>
where
    S: Selection<Output = Option<T>> + ?Sized,
{
    fetch(&NonNull::new(selection), endpoint, options).await
}

/// Spawn the pipeline for a selection and report through `on_complete`.
///
/// The endpoint is validated before anything is spawned: if it is not a
/// URL, `on_complete` receives `ResponseError::BadUrl` immediately and `None`
/// is returned. Otherwise the returned handle can cancel the request;
/// `on_complete` runs exactly once either way.
///
/// Runs on the current tokio runtime, or on a shared background runtime when
/// called outside one.
pub fn send<S, F>(
    selection: S,
    endpoint: &str,
    options: SendOptions,
    on_complete: F,
) -> Option<RequestHandle>
where
    S: Selection + Send + Sync + 'static,
    S::Output: Send + 'static,
    F: FnOnce(Result<GraphQLResult<S::Output, S::TypeLock>>) + Send + 'static,
{
    let url = match parse_endpoint(endpoint) {
        Ok(url) => url,
        Err(err) => {
            on_complete(Err(err));
            return None;
        }
    };

    let (handle, mut cancel_rx) = RequestHandle::new(RequestId::next());
    let guard = handle.clone();

    tracing::debug!(
        target: "lattice_graphql::send",
        request = %handle.id,
        method = %options.method,
        url = %url,
        "Dispatching GraphQL request"
    );

    runtime::spawn(async move {
        let result = tokio::select! {
            biased;
            _ = &mut cancel_rx => Err(ResponseError::Cancelled),
            result = execute(&selection, url, &options) => result,
        };

        // A cancel that lands after the pipeline finished still wins.
        let result = if guard.finish() {
            result
        } else {
            Err(ResponseError::Cancelled)
        };

        match &result {
            Ok(_) => {
                tracing::debug!(target: "lattice_graphql::send", request = %guard.id, "Request completed");
            }
            Err(err) => {
                tracing::debug!(target: "lattice_graphql::send", request = %guard.id, "Request failed: {}", err);
            }
        }

        on_complete(result);
    });

    Some(handle)
}

/// Like [`send`], but null data is an error instead of `None`.
pub fn send_non_null<S, T, F>(
    selection: S,
    endpoint: &str,
    options: SendOptions,
    on_complete: F,
) -> Option<RequestHandle>
where
    S: Selection<Output = Option<T>> + Send + Sync + 'static,
    T: Send + 'static,
    F: FnOnce(Result<GraphQLResult<T, S::TypeLock>>) + Send + 'static,
{
    send(NonNull::new(selection), endpoint, options, on_complete)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = SendOptions::new();
        assert_eq!(options.method, HttpMethod::Post);
        assert!(options.headers.is_empty());
        assert!(options.operation_name.is_none());
        assert!(options.session.is_none());
    }

    #[test]
    fn test_options_builder() {
        let options = SendOptions::new()
            .operation_name("Hello")
            .header("X-Trace", "1")
            .bearer_auth("token")
            .method(HttpMethod::Get);

        assert_eq!(options.operation_name.as_deref(), Some("Hello"));
        assert_eq!(options.method, HttpMethod::Get);
        assert_eq!(
            options.headers,
            vec![
                ("X-Trace".to_string(), "1".to_string()),
                ("Authorization".to_string(), "Bearer token".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_endpoint() {
        assert!(parse_endpoint("https://api.example.com/graphql").is_ok());
        assert!(matches!(
            parse_endpoint("not a url"),
            Err(ResponseError::BadUrl(_))
        ));
    }
}
