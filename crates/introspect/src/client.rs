//! HTTP client for introspection requests.

use crate::query::introspection_request_body;
use crate::{IntrospectionError, IntrospectionResponse, IntrospectionSchema, Result};
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Sends the introspection query to a GraphQL endpoint.
///
/// Every call to [`IntrospectionClient::fetch_schema`] is exactly one HTTP
/// attempt. Callers that want another try simply call again.
///
/// ```no_run
/// use graphql_introspect::IntrospectionClient;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = IntrospectionClient::new()
///     .with_header("Authorization", "Bearer my-token")
///     .with_timeout(Duration::from_secs(5));
/// let schema = client.fetch_schema("https://api.example.com/graphql").await?;
/// println!("{} types", schema.types.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IntrospectionClient {
    headers: BTreeMap<String, String>,
    timeout: Duration,
    connect_timeout: Duration,
}

impl Default for IntrospectionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl IntrospectionClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Upper bound for the whole request, connection included.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches and decodes the `__schema` payload from `url`.
    ///
    /// # Errors
    ///
    /// - [`IntrospectionError::Network`] when the request cannot be sent or
    ///   times out
    /// - [`IntrospectionError::Http`] for a non-success status
    /// - [`IntrospectionError::Parse`] when the body is not introspection JSON
    ///   or is served with a non-JSON content type
    /// - [`IntrospectionError::Invalid`] when the body carries no `data`
    #[tracing::instrument(skip(self), fields(headers = self.headers.len()))]
    pub async fn fetch_schema(&self, url: &str) -> Result<IntrospectionSchema> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| IntrospectionError::Network(format!("failed to build HTTP client: {e}")))?;

        let mut request = client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json");
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        tracing::debug!("sending introspection query");
        let response = request
            .json(&introspection_request_body())
            .send()
            .await
            .map_err(|e| IntrospectionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "endpoint returned error status");
            return Err(IntrospectionError::Http(status.as_u16(), body));
        }

        if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default();
            if !is_json_content_type(content_type) {
                tracing::warn!(content_type, "endpoint answered with a non-JSON body");
                return Err(IntrospectionError::Parse(format!(
                    "expected a JSON response, got content type `{content_type}`"
                )));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IntrospectionError::Network(e.to_string()))?;
        let decoded: IntrospectionResponse = serde_json::from_slice(&body)
            .map_err(|e| IntrospectionError::Parse(e.to_string()))?;
        let schema = decoded.into_schema()?;

        tracing::info!(
            types = schema.types.len(),
            directives = schema.directives.len(),
            "introspection succeeded"
        );
        Ok(schema)
    }
}

/// `application/json`, `application/graphql-response+json` and parameters
/// such as `; charset=utf-8`.
fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn minimal_response() -> serde_json::Value {
        serde_json::json!({
            "data": {
                "__schema": {
                    "queryType": { "name": "Query" },
                    "mutationType": null,
                    "subscriptionType": null,
                    "types": [{
                        "kind": "OBJECT",
                        "name": "Query",
                        "description": null,
                        "interfaces": [],
                        "fields": [{
                            "name": "ping",
                            "description": null,
                            "args": [],
                            "type": { "kind": "SCALAR", "name": "String", "ofType": null },
                            "isDeprecated": false,
                            "deprecationReason": null
                        }]
                    }],
                    "directives": []
                }
            }
        })
    }

    #[test]
    fn builder_collects_headers_and_timeout() {
        let client = IntrospectionClient::new()
            .with_header("Authorization", "Bearer token")
            .with_headers([("X-Api-Key", "abc"), ("Authorization", "Bearer other")])
            .with_timeout(Duration::from_secs(3));

        assert_eq!(client.headers.len(), 2);
        assert_eq!(client.headers["Authorization"], "Bearer other");
        assert_eq!(client.timeout, Duration::from_secs(3));
        assert_eq!(client.connect_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn fetches_schema_with_configured_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .header("authorization", "Bearer token")
                    .body_contains("IntrospectionQuery");
                then.status(200).json_body(minimal_response());
            })
            .await;

        let schema = IntrospectionClient::new()
            .with_header("Authorization", "Bearer token")
            .fetch_schema(&server.url("/graphql"))
            .await
            .unwrap();

        assert_eq!(schema.types.len(), 1);
        assert_eq!(schema.types[0].name(), "Query");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_reported_without_retrying() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(503).body("unavailable");
            })
            .await;

        let err = IntrospectionClient::new()
            .fetch_schema(&server.url("/graphql"))
            .await
            .unwrap_err();

        assert_eq!(err, IntrospectionError::Http(503, "unavailable".to_string()));
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn non_json_body_is_a_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200).body("<html>login</html>");
            })
            .await;

        let err = IntrospectionClient::new()
            .fetch_schema(&server.url("/graphql"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntrospectionError::Parse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn json_served_as_html_is_a_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(minimal_response().to_string());
            })
            .await;

        let err = IntrospectionClient::new()
            .fetch_schema(&server.url("/graphql"))
            .await
            .unwrap_err();
        assert!(
            matches!(&err, IntrospectionError::Parse(message) if message.contains("text/html")),
            "{err:?}"
        );
    }

    #[test]
    fn json_content_types_are_recognised() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("Application/JSON; charset=utf-8"));
        assert!(is_json_content_type("application/graphql-response+json"));
        assert!(!is_json_content_type("text/html; charset=utf-8"));
        assert!(!is_json_content_type("text/plain"));
    }

    #[tokio::test]
    async fn json_without_schema_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200)
                    .json_body(serde_json::json!({ "errors": [{ "message": "forbidden" }] }));
            })
            .await;

        let err = IntrospectionClient::new()
            .fetch_schema(&server.url("/graphql"))
            .await
            .unwrap_err();
        assert_eq!(err, IntrospectionError::Invalid("forbidden".to_string()));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let err = IntrospectionClient::new()
            .with_timeout(Duration::from_millis(500))
            .fetch_schema("http://127.0.0.1:1/graphql")
            .await
            .unwrap_err();
        assert!(matches!(err, IntrospectionError::Network(_)), "{err:?}");
    }
}
