//! GraphQL request payloads and the transport-agnostic request descriptor.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// A GraphQL operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A query operation (read-only).
    #[default]
    Query,
    /// A mutation operation (modifies data).
    Mutation,
    /// A subscription operation (real-time updates).
    Subscription,
}

/// The wire payload of a GraphQL operation.
///
/// Serializes to `{ "query", "variables"?, "operationName"?, "extensions"? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL document.
    pub query: String,

    /// Optional variables for the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,

    /// Optional operation name (for documents with multiple operations).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "operationName"
    )]
    pub operation_name: Option<String>,

    /// Extensions (implementation-specific metadata).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,

    #[serde(skip)]
    pub(crate) operation_type: OperationType,
}

impl GraphQLRequest {
    /// Create a query payload.
    pub fn query(query: impl Into<String>) -> Self {
        Self::with_type(query.into(), OperationType::Query)
    }

    /// Create a mutation payload.
    pub fn mutation(query: impl Into<String>) -> Self {
        Self::with_type(query.into(), OperationType::Mutation)
    }

    /// Create a subscription payload.
    pub fn subscription(query: impl Into<String>) -> Self {
        Self::with_type(query.into(), OperationType::Subscription)
    }

    /// Create a payload from a raw document, inferring its operation type.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let operation_type = Self::infer_operation_type(&query);
        Self::with_type(query, operation_type)
    }

    fn with_type(query: String, operation_type: OperationType) -> Self {
        Self {
            query,
            variables: None,
            operation_name: None,
            extensions: None,
            operation_type,
        }
    }

    /// Set a single variable.
    ///
    /// Values that fail to serialize are skipped.
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let name = name.into();
        let variables = self
            .variables
            .get_or_insert_with(|| Value::Object(Default::default()));
        match serde_json::to_value(value) {
            Ok(value) => {
                if let Value::Object(map) = variables {
                    map.insert(name, value);
                }
            }
            Err(e) => {
                tracing::warn!(target: "lattice_graphql::request", "Skipping variable '{}': {}", name, e);
            }
        }
        self
    }

    /// Replace all variables with a serializable value.
    pub fn variables(mut self, variables: impl Serialize) -> Self {
        self.variables = serde_json::to_value(variables).ok();
        self
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Set extensions.
    pub fn extensions(mut self, extensions: impl Serialize) -> Self {
        self.extensions = serde_json::to_value(extensions).ok();
        self
    }

    /// Get the operation type.
    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    /// Check if this is a subscription.
    pub fn is_subscription(&self) -> bool {
        self.operation_type == OperationType::Subscription
    }

    fn infer_operation_type(query: &str) -> OperationType {
        let trimmed = query.trim_start();
        if trimmed.starts_with("subscription") {
            OperationType::Subscription
        } else if trimmed.starts_with("mutation") {
            OperationType::Mutation
        } else {
            OperationType::Query
        }
    }
}

/// HTTP methods a GraphQL request can be sent with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    #[default]
    Post,
}

impl HttpMethod {
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// A fully built request, independent of any transport.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// The endpoint.
    pub url: Url,
    /// The HTTP method.
    pub method: HttpMethod,
    /// Request headers. `Content-Type` is always `application/json`.
    pub headers: HeaderMap,
    /// The serialized payload.
    pub body: Bytes,
}

impl RequestDescriptor {
    /// Build a descriptor from a payload and caller headers.
    ///
    /// Later headers replace earlier ones with the same name. Headers that
    /// are not valid HTTP names or values are skipped. `Content-Type` is
    /// written last and cannot be overridden.
    ///
    /// # Panics
    ///
    /// Panics if the payload fails to serialize. A `GraphQLRequest` only
    /// holds strings and JSON values, so this indicates a broken invariant.
    pub fn build(
        payload: &GraphQLRequest,
        url: Url,
        headers: &[(String, String)],
        method: HttpMethod,
    ) -> Self {
        let mut header_map = HeaderMap::with_capacity(headers.len() + 1);
        for (name, value) in headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    header_map.insert(name, value);
                }
                _ => {
                    tracing::warn!(target: "lattice_graphql::request", "Skipping invalid header '{}'", name);
                }
            }
        }
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = serde_json::to_vec(payload)
            .expect("GraphQL payload serialization is infallible");

        Self {
            url,
            method,
            headers: header_map,
            body: Bytes::from(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("https://api.example.com/graphql").unwrap()
    }

    #[test]
    fn test_query_request() {
        let request = GraphQLRequest::query("{ users { id } }");
        assert_eq!(request.operation_type(), OperationType::Query);
        assert!(request.variables.is_none());
    }

    #[test]
    fn test_subscription_request() {
        let request = GraphQLRequest::subscription("subscription { userCreated { id } }");
        assert!(request.is_subscription());
    }

    #[test]
    fn test_variables() {
        let request = GraphQLRequest::query("query($id: ID!) { user(id: $id) { name } }")
            .variable("id", "123")
            .variable("limit", 10);

        let vars = request.variables.unwrap();
        assert_eq!(vars["id"], "123");
        assert_eq!(vars["limit"], 10);
    }

    #[test]
    fn test_infer_operation_type() {
        assert_eq!(
            GraphQLRequest::new("query { users }").operation_type(),
            OperationType::Query
        );
        assert_eq!(
            GraphQLRequest::new("  mutation { create }").operation_type(),
            OperationType::Mutation
        );
        assert_eq!(
            GraphQLRequest::new("subscription { events }").operation_type(),
            OperationType::Subscription
        );
        assert_eq!(
            GraphQLRequest::new("{ hello }").operation_type(),
            OperationType::Query
        );
    }

    #[test]
    fn test_serialized_shape() {
        let request = GraphQLRequest::query("query Hello { hello }").operation_name("Hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"query": "query Hello { hello }", "operationName": "Hello"})
        );
    }

    #[test]
    fn test_descriptor_forces_json_content_type() {
        let headers = vec![
            ("Content-Type".to_string(), "text/plain".to_string()),
            ("Authorization".to_string(), "Bearer token".to_string()),
        ];
        let descriptor = RequestDescriptor::build(
            &GraphQLRequest::query("{ hello }"),
            endpoint(),
            &headers,
            HttpMethod::Post,
        );

        assert_eq!(descriptor.headers[CONTENT_TYPE], "application/json");
        assert_eq!(descriptor.headers["authorization"], "Bearer token");
        assert_eq!(descriptor.headers.get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn test_descriptor_last_header_wins() {
        let headers = vec![
            ("X-Trace".to_string(), "first".to_string()),
            ("x-trace".to_string(), "second".to_string()),
        ];
        let descriptor = RequestDescriptor::build(
            &GraphQLRequest::query("{ hello }"),
            endpoint(),
            &headers,
            HttpMethod::Get,
        );

        assert_eq!(descriptor.headers["x-trace"], "second");
        assert_eq!(descriptor.headers.len(), 2);
        assert_eq!(descriptor.method, HttpMethod::Get);
    }

    #[test]
    fn test_descriptor_skips_invalid_headers() {
        let headers = vec![("bad header".to_string(), "value".to_string())];
        let descriptor = RequestDescriptor::build(
            &GraphQLRequest::query("{ hello }"),
            endpoint(),
            &headers,
            HttpMethod::Post,
        );
        assert_eq!(descriptor.headers.len(), 1);
    }

    #[test]
    fn test_descriptor_body_is_payload_json() {
        let payload = GraphQLRequest::query("{ hello }").variable("name", "World");
        let descriptor =
            RequestDescriptor::build(&payload, endpoint(), &[], HttpMethod::Post);

        let body: Value = serde_json::from_slice(&descriptor.body).unwrap();
        assert_eq!(body["query"], "{ hello }");
        assert_eq!(body["variables"]["name"], "World");
        assert!(body.get("operationName").is_none());
    }

    #[test]
    fn test_default_method_is_post() {
        assert_eq!(HttpMethod::default(), HttpMethod::Post);
        assert_eq!(HttpMethod::Get.to_string(), "GET");
    }
}
