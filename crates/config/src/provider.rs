use crate::{find_config, load_config, GraphQLConfig, ProjectConfig, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// A project's configuration together with the directory its relative paths
/// resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    pub name: Arc<str>,
    pub root: PathBuf,
    pub config: Arc<ProjectConfig>,
}

/// Resolves project names to their configuration.
///
/// Consulted on every cache miss, so implementations should be cheap.
pub trait ProjectConfigProvider: Send + Sync {
    fn resolve(&self, project: &str) -> Option<ResolvedProject>;
}

/// The configuration of one workspace, replaceable at runtime when the
/// config file changes.
#[derive(Debug)]
pub struct WorkspaceConfig {
    root: PathBuf,
    config: RwLock<Arc<GraphQLConfig>>,
}

impl WorkspaceConfig {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: GraphQLConfig) -> Self {
        Self {
            root: root.into(),
            config: RwLock::new(Arc::new(config)),
        }
    }

    /// Finds and loads the nearest config file above `dir`. The directory
    /// holding the file becomes the workspace root.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        let Some(path) = find_config(dir)? else {
            return Ok(None);
        };
        let config = load_config(&path)?;
        let root = path.parent().unwrap_or(dir).to_path_buf();
        Ok(Some(Self::new(root, config)))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config(&self) -> Arc<GraphQLConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a new configuration. Callers are responsible for evicting
    /// cache entries built from the old one.
    pub fn set_config(&self, config: GraphQLConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }

    #[must_use]
    pub fn project_names(&self) -> Vec<String> {
        self.config()
            .projects()
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

impl ProjectConfigProvider for WorkspaceConfig {
    fn resolve(&self, project: &str) -> Option<ResolvedProject> {
        let config = self.config();
        let project_config = config.get_project(project)?;
        Some(ResolvedProject {
            name: Arc::from(project),
            root: self.root.clone(),
            config: Arc::new(project_config.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SchemaConfig, DEFAULT_PROJECT};

    fn single(schema: &str) -> GraphQLConfig {
        GraphQLConfig::Single(Box::new(ProjectConfig {
            schema: Some(SchemaConfig::Path(schema.to_string())),
            ..ProjectConfig::default()
        }))
    }

    #[test]
    fn resolves_known_projects_only() {
        let workspace = WorkspaceConfig::new("/repo", single("schema.graphql"));

        let resolved = workspace.resolve(DEFAULT_PROJECT).unwrap();
        assert_eq!(&*resolved.name, DEFAULT_PROJECT);
        assert_eq!(resolved.root, Path::new("/repo"));
        assert!(workspace.resolve("missing").is_none());
    }

    #[test]
    fn set_config_is_visible_to_later_resolves() {
        let workspace = WorkspaceConfig::new("/repo", single("old.graphql"));
        workspace.set_config(single("new.graphql"));

        let resolved = workspace.resolve(DEFAULT_PROJECT).unwrap();
        assert_eq!(resolved.config.schema_paths(), ["new.graphql"]);
    }

    #[test]
    fn discover_uses_config_directory_as_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".graphqlrc.yml"), "schema: schema.graphql\n").unwrap();
        let nested = dir.path().join("src");
        std::fs::create_dir(&nested).unwrap();

        let workspace = WorkspaceConfig::discover(&nested).unwrap().unwrap();
        assert_eq!(workspace.root(), dir.path());
        assert_eq!(workspace.project_names(), [DEFAULT_PROJECT]);
    }
}
