use graphql_introspect::IntrospectionError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Why a project's schema could not be produced.
///
/// Cloneable so that every caller sharing one in-flight build receives the
/// same error.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("failed to load schema source {path}: {message}")]
    SchemaLoad { path: PathBuf, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("schema validation failed: {message}")]
    Validation { message: String },

    #[error("directive @{name} in {path} redefines a built-in directive")]
    DirectiveConflict { name: String, path: PathBuf },

    #[error("schema endpoint {url} is unavailable: {source}")]
    EndpointUnavailable {
        url: String,
        #[source]
        source: IntrospectionError,
    },
}
