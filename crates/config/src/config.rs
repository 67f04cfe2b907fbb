use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Name given to the project of a single-project configuration.
pub const DEFAULT_PROJECT: &str = "default";

const DEFAULT_ENDPOINT_TIMEOUT_SECS: u64 = 30;

/// Top-level GraphQL configuration.
/// Either a single project or multiple named projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphQLConfig {
    Multi {
        projects: BTreeMap<String, ProjectConfig>,
    },
    /// Boxed to keep the enum small.
    Single(Box<ProjectConfig>),
}

impl GraphQLConfig {
    /// All projects in name order.
    /// A single-project config yields one project named [`DEFAULT_PROJECT`].
    #[must_use]
    pub fn projects(&self) -> Box<dyn Iterator<Item = (&str, &ProjectConfig)> + '_> {
        match self {
            Self::Single(config) => Box::new(std::iter::once((DEFAULT_PROJECT, config.as_ref()))),
            Self::Multi { projects } => {
                Box::new(projects.iter().map(|(name, config)| (name.as_str(), config)))
            }
        }
    }

    #[must_use]
    pub fn get_project(&self, name: &str) -> Option<&ProjectConfig> {
        match self {
            Self::Single(config) if name == DEFAULT_PROJECT => Some(config.as_ref()),
            Self::Single(_) => None,
            Self::Multi { projects } => projects.get(name),
        }
    }

    #[must_use]
    pub const fn is_multi_project(&self) -> bool {
        matches!(self, Self::Multi { .. })
    }

    #[must_use]
    pub fn project_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi { projects } => projects.len(),
        }
    }
}

/// Configuration for a single GraphQL project.
///
/// ```yaml
/// schema: ./schema/**/*.graphql
/// endpoint:
///   url: https://api.example.com/graphql
///   headers:
///     Authorization: Bearer token
/// documents: src/**/*.{graphql,gql}
/// exclude:
///   - src/generated/**
/// extensions:
///   customDirectives:
///     - ./directives.graphql
///     - "directive @cached(ttl: Int) on FIELD"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// On-disk schema file, directory or glob. May also hold an endpoint URL
    /// or an introspection object, in which case it acts as the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaConfig>,

    /// Remote endpoint to introspect. Takes precedence over an endpoint
    /// given through `schema`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointConfig>,

    /// Include globs scanned for fragment and type definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentsConfig>,

    /// Globs removed from the document scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, serde_json::Value>>,
}

impl ProjectConfig {
    /// Local schema paths, with any URL entries left out.
    #[must_use]
    pub fn schema_paths(&self) -> Vec<&str> {
        self.schema
            .as_ref()
            .map(SchemaConfig::paths)
            .unwrap_or_default()
            .into_iter()
            .filter(|path| !is_url(path))
            .collect()
    }

    /// Endpoint to introspect, if any.
    ///
    /// Resolution order: the `endpoint` key, then an introspection object
    /// under `schema`, then the first URL listed under `schema`.
    #[must_use]
    pub fn endpoint(&self) -> Option<EndpointConfig> {
        if let Some(endpoint) = &self.endpoint {
            return Some(endpoint.clone());
        }
        match self.schema.as_ref()? {
            SchemaConfig::Introspection(endpoint) => Some(endpoint.clone()),
            schema => schema
                .paths()
                .into_iter()
                .find(|path| is_url(path))
                .map(EndpointConfig::new),
        }
    }

    #[must_use]
    pub fn document_patterns(&self) -> Vec<&str> {
        self.documents
            .as_ref()
            .map(DocumentsConfig::patterns)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn exclude_patterns(&self) -> Vec<&str> {
        self.exclude
            .iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Custom directive sources declared under `extensions.customDirectives`.
    ///
    /// The value may be a single string or a list. Entries of the form
    /// `directive @name ...` are inline SDL; everything else, including paths
    /// such as `directives.graphql`, is a path or glob.
    #[must_use]
    pub fn custom_directives(&self) -> Vec<DirectiveSource> {
        let Some(value) = self
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("customDirectives"))
        else {
            return Vec::new();
        };

        let entries: Vec<&str> = match value {
            serde_json::Value::String(entry) => vec![entry.as_str()],
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| {
                    let entry = item.as_str();
                    if entry.is_none() {
                        tracing::warn!(%item, "ignoring non-string customDirectives entry");
                    }
                    entry
                })
                .collect(),
            other => {
                tracing::warn!(value = %other, "customDirectives must be a string or a list");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .map(|entry| {
                if is_inline_directive(entry) {
                    DirectiveSource::Inline(entry.to_string())
                } else {
                    DirectiveSource::Path(entry.to_string())
                }
            })
            .collect()
    }
}

fn is_inline_directive(entry: &str) -> bool {
    entry
        .trim_start()
        .strip_prefix("directive")
        .is_some_and(|rest| {
            rest.starts_with(char::is_whitespace) && rest.trim_start().starts_with('@')
        })
}

/// Where a custom directive definition comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveSource {
    /// File path or glob, relative to the project root.
    Path(String),
    /// SDL written directly in the configuration.
    Inline(String),
}

/// Schema source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaConfig {
    /// Single file, directory or glob
    Path(String),
    Paths(Vec<String>),
    Introspection(EndpointConfig),
}

impl SchemaConfig {
    /// Path-like entries; empty for an introspection object.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::Path(path) => vec![path.as_str()],
            Self::Paths(paths) => paths.iter().map(String::as_str).collect(),
            Self::Introspection(_) => vec![],
        }
    }
}

/// A remote GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub url: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl EndpointConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_ENDPOINT_TIMEOUT_SECS))
    }
}

/// Documents source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentsConfig {
    Pattern(String),
    Patterns(Vec<String>),
}

impl DocumentsConfig {
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            Self::Pattern(pattern) => vec![pattern.as_str()],
            Self::Patterns(patterns) => patterns.iter().map(String::as_str).collect(),
        }
    }
}

fn is_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}
