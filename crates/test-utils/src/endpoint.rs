//! Scripted introspection endpoints.

use async_trait::async_trait;
use graphql_config::EndpointConfig;
use graphql_introspect::{IntrospectionError, IntrospectionSchema};
use graphql_project::EndpointLoader;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// An [`EndpointLoader`] that answers every call with the same result and
/// remembers which URLs were requested.
pub struct MockEndpointLoader {
    response: Result<IntrospectionSchema, IntrospectionError>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl MockEndpointLoader {
    pub fn succeeding(schema: IntrospectionSchema) -> Self {
        Self::with_response(Ok(schema))
    }

    pub fn failing(error: IntrospectionError) -> Self {
        Self::with_response(Err(error))
    }

    /// Fails like an unreachable host.
    pub fn unreachable() -> Self {
        Self::failing(IntrospectionError::Network("connection refused".to_string()))
    }

    fn with_response(response: Result<IntrospectionSchema, IntrospectionError>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("url log mutex poisoned").clone()
    }
}

#[async_trait]
impl EndpointLoader for MockEndpointLoader {
    async fn load(
        &self,
        endpoint: &EndpointConfig,
    ) -> Result<IntrospectionSchema, IntrospectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls
            .lock()
            .expect("url log mutex poisoned")
            .push(endpoint.url.clone());
        self.response.clone()
    }
}
