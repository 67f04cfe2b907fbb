//! Per-project schema materialization.

use crate::cache::SingleFlightCache;
use crate::endpoint::EndpointLoader;
use crate::fs::FileSystem;
use crate::schema::{build_schema, build_schema_from_introspection, BuiltSchema, SchemaBuilder};
use crate::{ProjectKey, Result, SchemaError};
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use futures::FutureExt;
use graphql_config::{ProjectConfigProvider, ResolvedProject};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Where a cached schema was materialized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Disk,
    Endpoint,
}

/// A successfully built schema for one project.
#[derive(Debug)]
pub struct CachedSchemaEntry {
    pub project: ProjectKey,
    pub schema: Arc<Valid<Schema>>,
    pub source_kind: SourceKind,
    /// Every file read to build the schema, directive extensions included.
    pub source_paths: BTreeSet<PathBuf>,
}

/// Memoizes one schema per project.
///
/// A project with an endpoint is introspected first; if that fails and the
/// project also names schema files, those are built instead. Projects with
/// neither have no schema, and that answer is never cached.
pub struct ProjectSchemaCache {
    provider: Arc<dyn ProjectConfigProvider>,
    fs: Arc<dyn FileSystem>,
    endpoints: Arc<dyn EndpointLoader>,
    entries: SingleFlightCache<Arc<CachedSchemaEntry>, SchemaError>,
}

impl ProjectSchemaCache {
    pub fn new(
        provider: Arc<dyn ProjectConfigProvider>,
        fs: Arc<dyn FileSystem>,
        endpoints: Arc<dyn EndpointLoader>,
    ) -> Self {
        Self {
            provider,
            fs,
            endpoints,
            entries: SingleFlightCache::default(),
        }
    }

    /// The schema for `project`, building it on a miss.
    ///
    /// Returns `Ok(None)` when the project is unknown or configures no schema
    /// source.
    pub async fn get_schema(&self, project: &str) -> Result<Option<Arc<Valid<Schema>>>> {
        Ok(self
            .get_entry(project)
            .await?
            .map(|entry| Arc::clone(&entry.schema)))
    }

    /// Like [`Self::get_schema`], with the build metadata.
    #[tracing::instrument(skip(self))]
    pub async fn get_entry(&self, project: &str) -> Result<Option<Arc<CachedSchemaEntry>>> {
        if let Some(entry) = self.entries.get(project) {
            return Ok(Some(entry));
        }

        let Some(resolved) = self.provider.resolve(project) else {
            tracing::warn!("unknown project");
            return Ok(None);
        };
        if resolved.config.endpoint().is_none() && resolved.config.schema_paths().is_empty() {
            tracing::debug!("project has no schema source");
            return Ok(None);
        }

        let key = Arc::clone(&resolved.name);
        let fs = Arc::clone(&self.fs);
        let endpoints = Arc::clone(&self.endpoints);
        let entry = self
            .entries
            .get_or_build(&key, move || {
                async move {
                    materialize(fs.as_ref(), endpoints.as_ref(), &resolved)
                        .await
                        .map(Arc::new)
                }
                .boxed()
            })
            .await?;
        Ok(Some(entry))
    }

    /// The stored entry for `project`, without building.
    #[must_use]
    pub fn cached_entry(&self, project: &str) -> Option<Arc<CachedSchemaEntry>> {
        self.entries.get(project)
    }

    /// Evicts `project`'s schema, detaching any build in progress.
    pub fn invalidate(&self, project: &str) -> bool {
        let evicted = self.entries.invalidate(project);
        if evicted {
            tracing::debug!(project, "schema evicted");
        }
        evicted
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of projects with a stored schema.
    #[must_use]
    pub fn size_for_testing(&self) -> usize {
        self.entries.len()
    }
}

#[tracing::instrument(skip_all, fields(project = %project.name))]
async fn materialize(
    fs: &dyn FileSystem,
    endpoints: &dyn EndpointLoader,
    project: &ResolvedProject,
) -> Result<CachedSchemaEntry> {
    let start = Instant::now();
    let builder = SchemaBuilder::new(fs, &project.root);
    let disk_paths = project.config.schema_paths();

    if let Some(endpoint) = project.config.endpoint() {
        match endpoints.load(&endpoint).await {
            Ok(introspection) => {
                let directives = builder
                    .load_directive_sources(&project.config.custom_directives())
                    .await?;
                let built = build_schema_from_introspection(&endpoint.url, &introspection, &directives)?;
                tracing::info!(
                    url = %endpoint.url,
                    duration_ms = start.elapsed().as_millis(),
                    "schema built from endpoint"
                );
                return Ok(entry(project, built, SourceKind::Endpoint));
            }
            Err(error) if !disk_paths.is_empty() => {
                tracing::warn!(url = %endpoint.url, %error, "endpoint failed, falling back to schema files");
            }
            Err(source) => {
                return Err(SchemaError::EndpointUnavailable {
                    url: endpoint.url,
                    source,
                });
            }
        }
    }

    let sources = builder.load_schema_sources(&disk_paths).await?;
    let directives = builder
        .load_directive_sources(&project.config.custom_directives())
        .await?;
    let built = build_schema(&sources, &directives)?;
    tracing::info!(
        files = built.source_paths.len(),
        duration_ms = start.elapsed().as_millis(),
        "schema built from disk"
    );
    Ok(entry(project, built, SourceKind::Disk))
}

fn entry(project: &ResolvedProject, built: BuiltSchema, source_kind: SourceKind) -> CachedSchemaEntry {
    CachedSchemaEntry {
        project: Arc::clone(&project.name),
        schema: Arc::new(built.schema),
        source_kind,
        source_paths: built.source_paths,
    }
}
