//! Remote schema loading.

use async_trait::async_trait;
use graphql_config::EndpointConfig;
use graphql_introspect::{IntrospectionClient, IntrospectionError, IntrospectionSchema};

/// Fetches a schema by introspecting a remote endpoint.
///
/// Each call is a single attempt. Any error tells the caller to fall back to
/// on-disk definitions when it has them.
#[async_trait]
pub trait EndpointLoader: Send + Sync {
    async fn load(
        &self,
        endpoint: &EndpointConfig,
    ) -> Result<IntrospectionSchema, IntrospectionError>;
}

/// [`EndpointLoader`] speaking HTTP through [`IntrospectionClient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpEndpointLoader;

#[async_trait]
impl EndpointLoader for HttpEndpointLoader {
    #[tracing::instrument(skip_all, fields(url = %endpoint.url))]
    async fn load(
        &self,
        endpoint: &EndpointConfig,
    ) -> Result<IntrospectionSchema, IntrospectionError> {
        IntrospectionClient::new()
            .with_headers(endpoint.headers.clone())
            .with_timeout(endpoint.timeout())
            .fetch_schema(&endpoint.url)
            .await
    }
}
