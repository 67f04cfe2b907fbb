use thiserror::Error;

pub type Result<T> = std::result::Result<T, IntrospectionError>;

/// Failure modes of a single introspection request.
///
/// Cloneable so one failed fetch can be reported to every caller that was
/// waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntrospectionError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error {0}: {1}")]
    Http(u16, String),

    #[error("failed to parse introspection response: {0}")]
    Parse(String),

    #[error("invalid introspection response: {0}")]
    Invalid(String),
}

impl IntrospectionError {
    /// HTTP status code, when the endpoint answered with a non-success status.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(status, _) => Some(*status),
            _ => None,
        }
    }
}
