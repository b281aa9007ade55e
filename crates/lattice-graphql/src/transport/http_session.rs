//! `reqwest`-backed session.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::redirect::Policy;
use thiserror::Error;

use super::{ResponseHead, ResponseMeta, Session, TransportOutcome};
use crate::error::TransportError;
use crate::request::RequestDescriptor;

/// Errors raised while building an [`HttpSession`].
#[derive(Debug, Clone, Error)]
pub enum SessionBuildError {
    /// The proxy URL was rejected.
    #[error("proxy error: {0}")]
    Proxy(String),
    /// A default header name or value is invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// The underlying client could not be created.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Configuration for an [`HttpSession`].
#[derive(Clone, Debug)]
pub struct HttpSessionConfig {
    /// Request timeout. Expiry surfaces as `ResponseError::Timeout`.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Whether to follow redirects.
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
    /// Proxy URL.
    pub proxy: Option<String>,
}

impl Default for HttpSessionConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            follow_redirects: true,
            max_redirects: 10,
            user_agent: Some(format!(
                "LatticeGraphQL/{} (Rust)",
                env!("CARGO_PKG_VERSION")
            )),
            proxy: None,
        }
    }
}

/// Builder for an [`HttpSession`].
pub struct HttpSessionBuilder {
    config: HttpSessionConfig,
    default_headers: http::HeaderMap,
}

impl Default for HttpSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpSessionBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpSessionConfig::default(),
            default_headers: http::HeaderMap::new(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disable request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Disable redirect following.
    pub fn no_redirects(mut self) -> Self {
        self.config.follow_redirects = false;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set a proxy URL.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Add a header sent with every request made through this session.
    ///
    /// Per-request headers with the same name take precedence.
    pub fn default_header(
        mut self,
        name: &str,
        value: &str,
    ) -> Result<Self, SessionBuildError> {
        let name = http::HeaderName::try_from(name)
            .map_err(|e| SessionBuildError::InvalidHeader(e.to_string()))?;
        let value = http::HeaderValue::try_from(value)
            .map_err(|e| SessionBuildError::InvalidHeader(e.to_string()))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Build the session.
    pub fn build(self) -> Result<HttpSession, SessionBuildError> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if self.config.follow_redirects {
            builder = builder.redirect(Policy::limited(self.config.max_redirects));
        } else {
            builder = builder.redirect(Policy::none());
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        if let Some(ref proxy_url) = self.config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| SessionBuildError::Proxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        builder = builder.default_headers(self.default_headers);

        let client = builder
            .build()
            .map_err(|e| SessionBuildError::Client(e.to_string()))?;

        Ok(HttpSession {
            inner: Arc::new(HttpSessionInner {
                client,
                config: self.config,
            }),
        })
    }
}

struct HttpSessionInner {
    client: reqwest::Client,
    config: HttpSessionConfig,
}

/// A [`Session`] that executes requests over HTTP with `reqwest`.
///
/// Cheaply cloneable; clones share one connection pool.
#[derive(Clone)]
pub struct HttpSession {
    inner: Arc<HttpSessionInner>,
}

impl Default for HttpSession {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpSession {
    /// Create a session with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized.
    pub fn new() -> Self {
        HttpSessionBuilder::new()
            .build()
            .expect("Failed to create HTTP session with default configuration")
    }

    /// Create a builder for configuring a session.
    pub fn builder() -> HttpSessionBuilder {
        HttpSessionBuilder::new()
    }

    /// Get the session's configuration.
    pub fn config(&self) -> &HttpSessionConfig {
        &self.inner.config
    }

    async fn perform(&self, request: RequestDescriptor) -> TransportOutcome {
        let RequestDescriptor {
            url,
            method,
            headers,
            body,
        } = request;

        tracing::debug!(target: "lattice_graphql::http", "{} {}", method, url);

        let response = match self
            .inner
            .client
            .request(method.to_reqwest(), url)
            .headers(headers)
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return TransportOutcome::failed(err.into()),
        };

        let head = ResponseHead::from_reqwest(&response);
        tracing::debug!(target: "lattice_graphql::http", "Response status {}", head.status);

        match response.bytes().await {
            Ok(body) => TransportOutcome::completed(head, body),
            Err(err) => TransportOutcome {
                body: None,
                response: Some(ResponseMeta::Http(head)),
                error: Some(TransportError::from(err)),
            },
        }
    }
}

impl Session for HttpSession {
    fn execute(&self, request: RequestDescriptor) -> BoxFuture<'_, TransportOutcome> {
        Box::pin(self.perform(request))
    }
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("config", &self.inner.config)
            .finish()
    }
}
