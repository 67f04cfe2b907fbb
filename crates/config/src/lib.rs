//! Project configuration for GraphQL workspaces.
//!
//! Reads `.graphqlrc`-style files into [`GraphQLConfig`] and exposes resolved
//! projects to the rest of the workspace through [`ProjectConfigProvider`].

mod config;
mod error;
mod loader;
mod provider;

pub use config::{
    DirectiveSource, DocumentsConfig, EndpointConfig, GraphQLConfig, ProjectConfig, SchemaConfig,
    DEFAULT_PROJECT,
};
pub use error::{ConfigError, Result};
pub use loader::{find_config, load_config, load_config_from_str, CONFIG_FILES};
pub use provider::{ProjectConfigProvider, ResolvedProject, WorkspaceConfig};
