use crate::dependencies;
use crate::endpoint::{EndpointLoader, HttpEndpointLoader};
use crate::fs::{FileSystem, OsFileSystem};
use crate::index::{DefinitionMap, DefinitionRecord, ProjectIndexCache};
use crate::invalidation::{evictions_for, Evictions, FileChange};
use crate::schema_cache::{CachedSchemaEntry, ProjectSchemaCache};
use crate::{ProjectKey, Result};
use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use graphql_config::ProjectConfigProvider;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Schema and definition caches for every project of a workspace.
///
/// Cheap to clone; clones share the same caches.
#[derive(Clone)]
pub struct ProjectCache {
    provider: Arc<dyn ProjectConfigProvider>,
    schemas: Arc<ProjectSchemaCache>,
    index: Arc<ProjectIndexCache>,
}

impl ProjectCache {
    /// A cache reading from the local disk and introspecting over HTTP.
    pub fn new(provider: Arc<dyn ProjectConfigProvider>) -> Self {
        Self::with_backends(provider, Arc::new(OsFileSystem), Arc::new(HttpEndpointLoader))
    }

    pub fn with_backends(
        provider: Arc<dyn ProjectConfigProvider>,
        fs: Arc<dyn FileSystem>,
        endpoints: Arc<dyn EndpointLoader>,
    ) -> Self {
        Self {
            schemas: Arc::new(ProjectSchemaCache::new(
                Arc::clone(&provider),
                Arc::clone(&fs),
                endpoints,
            )),
            index: Arc::new(ProjectIndexCache::new(Arc::clone(&provider), fs)),
            provider,
        }
    }

    pub async fn get_schema(&self, project: &str) -> Result<Option<Arc<Valid<Schema>>>> {
        self.schemas.get_schema(project).await
    }

    pub async fn schema_entry(&self, project: &str) -> Result<Option<Arc<CachedSchemaEntry>>> {
        self.schemas.get_entry(project).await
    }

    #[must_use]
    pub fn schemas(&self) -> &ProjectSchemaCache {
        &self.schemas
    }

    #[must_use]
    pub fn index(&self) -> &ProjectIndexCache {
        &self.index
    }

    pub async fn fragment_definitions(&self, project: &str) -> Arc<DefinitionMap> {
        self.index.fragment_definitions(project).await
    }

    pub async fn named_type_definitions(&self, project: &str) -> Arc<DefinitionMap> {
        self.index.named_type_definitions(project).await
    }

    /// Fragments from `project` that `document` depends on.
    pub async fn fragment_dependencies(
        &self,
        project: &str,
        document: &ast::Document,
    ) -> Vec<DefinitionRecord> {
        let fragments = self.fragment_definitions(project).await;
        dependencies::fragment_dependencies(document, &fragments)
    }

    /// Named types from `project` that `document` depends on.
    pub async fn object_type_dependencies(
        &self,
        project: &str,
        document: &ast::Document,
    ) -> Vec<DefinitionRecord> {
        let types = self.named_type_definitions(project).await;
        dependencies::object_type_dependencies(document, &types)
    }

    pub async fn fragment_dependencies_for_source(
        &self,
        project: &str,
        source: &str,
    ) -> Vec<DefinitionRecord> {
        let fragments = self.fragment_definitions(project).await;
        dependencies::fragment_dependencies_for_source(source, &fragments)
    }

    pub async fn object_type_dependencies_for_source(
        &self,
        project: &str,
        source: &str,
    ) -> Vec<DefinitionRecord> {
        let types = self.named_type_definitions(project).await;
        dependencies::object_type_dependencies_for_source(source, &types)
    }

    /// Drops both cached entries of `project`.
    pub fn invalidate(&self, project: &str) -> Evictions {
        Evictions {
            schema: self.schemas.invalidate(project),
            index: self.index.invalidate(project),
        }
    }

    pub fn clear(&self) {
        self.schemas.clear();
        self.index.clear();
    }

    /// Applies a batch of changes under `root` to `project`'s entries and
    /// returns what was decided stale.
    #[tracing::instrument(skip(self, changes), fields(changes = changes.len()))]
    pub fn apply_changes(&self, root: &Path, project: &str, changes: &[FileChange]) -> Evictions {
        let Some(resolved) = self.provider.resolve(project) else {
            tracing::debug!("project no longer configured, dropping its entries");
            return self.invalidate(project);
        };

        let changes: Vec<FileChange> = changes
            .iter()
            .map(|change| FileChange {
                name: root.join(&change.name),
                ..change.clone()
            })
            .collect();
        let sources = self
            .schemas
            .cached_entry(project)
            .map(|entry| entry.source_paths.clone());
        let evictions = evictions_for(&changes, &resolved.root, &resolved.config, sources.as_ref());

        if evictions.schema {
            self.schemas.invalidate(project);
        }
        if evictions.index {
            self.index.invalidate(project);
        }
        if evictions.any() {
            tracing::info!(
                schema = evictions.schema,
                index = evictions.index,
                "file changes invalidated project"
            );
        }
        evictions
    }

    /// A watcher callback for changes under `root` affecting `project`.
    ///
    /// Each invocation evicts stale entries without rebuilding them and
    /// returns the keys of the projects it invalidated.
    pub fn handle_file_change_event(
        &self,
        root: impl Into<PathBuf>,
        project: impl Into<ProjectKey>,
    ) -> impl Fn(&[FileChange]) -> HashSet<ProjectKey> + Send + Sync + 'static {
        let cache = self.clone();
        let root = root.into();
        let project = project.into();
        move |changes: &[FileChange]| {
            let mut evicted = HashSet::new();
            if cache.apply_changes(&root, &project, changes).any() {
                evicted.insert(Arc::clone(&project));
            }
            evicted
        }
    }
}
