//! Project-wide index of fragment and named type definitions.

use crate::cache::SingleFlightCache;
use crate::document::{DocumentLoader, ParsedDocument};
use crate::fs::FileSystem;
use apollo_compiler::ast;
use futures::FutureExt;
use graphql_config::ProjectConfigProvider;
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

/// A top-level definition together with the file it came from.
#[derive(Debug, Clone)]
pub struct DefinitionRecord {
    pub name: Arc<str>,
    pub file_path: PathBuf,
    /// Source text of this definition alone.
    pub content: Arc<str>,
    pub definition: ast::Definition,
}

pub type DefinitionMap = HashMap<Arc<str>, DefinitionRecord>;

/// Fragments and named types found across a project's documents.
#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    pub fragments: Arc<DefinitionMap>,
    pub types: Arc<DefinitionMap>,
}

impl ProjectIndex {
    /// Indexes `documents` in order. A name defined twice keeps the
    /// definition from the later document.
    #[must_use]
    pub fn from_documents(documents: &[ParsedDocument]) -> Self {
        let mut fragments = DefinitionMap::new();
        let mut types = DefinitionMap::new();

        for document in documents {
            for definition in &document.ast.definitions {
                let target = match definition {
                    ast::Definition::FragmentDefinition(_) => &mut fragments,
                    ast::Definition::ObjectTypeDefinition(_)
                    | ast::Definition::InterfaceTypeDefinition(_)
                    | ast::Definition::UnionTypeDefinition(_)
                    | ast::Definition::EnumTypeDefinition(_)
                    | ast::Definition::InputObjectTypeDefinition(_)
                    | ast::Definition::ScalarTypeDefinition(_) => &mut types,
                    _ => continue,
                };
                let Some(name) = definition.name() else {
                    continue;
                };
                let name: Arc<str> = Arc::from(name.as_str());
                if let Some(previous) = target.get(&name) {
                    tracing::debug!(
                        name = %name,
                        previous = %previous.file_path.display(),
                        file = %document.path.display(),
                        "definition shadowed by later file"
                    );
                }
                target.insert(
                    Arc::clone(&name),
                    DefinitionRecord {
                        name,
                        file_path: document.path.clone(),
                        content: definition_text(document, definition),
                        definition: definition.clone(),
                    },
                );
            }
        }

        Self {
            fragments: Arc::new(fragments),
            types: Arc::new(types),
        }
    }
}

fn definition_text(document: &ParsedDocument, definition: &ast::Definition) -> Arc<str> {
    definition
        .location()
        .and_then(|span| document.text.get(span.offset()..span.end_offset()))
        .map_or_else(|| Arc::from(definition.to_string()), Arc::from)
}

/// Memoizes one [`ProjectIndex`] per project.
pub struct ProjectIndexCache {
    provider: Arc<dyn ProjectConfigProvider>,
    fs: Arc<dyn FileSystem>,
    entries: SingleFlightCache<Arc<ProjectIndex>, Infallible>,
}

impl ProjectIndexCache {
    pub fn new(provider: Arc<dyn ProjectConfigProvider>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            provider,
            fs,
            entries: SingleFlightCache::default(),
        }
    }

    pub async fn fragment_definitions(&self, project: &str) -> Arc<DefinitionMap> {
        Arc::clone(&self.index(project).await.fragments)
    }

    pub async fn named_type_definitions(&self, project: &str) -> Arc<DefinitionMap> {
        Arc::clone(&self.index(project).await.types)
    }

    /// The index for `project`, scanning its documents on a miss.
    ///
    /// Unknown projects get an empty index that is not stored.
    #[tracing::instrument(skip(self))]
    pub async fn index(&self, project: &str) -> Arc<ProjectIndex> {
        if let Some(index) = self.entries.get(project) {
            return index;
        }
        let Some(resolved) = self.provider.resolve(project) else {
            tracing::warn!("unknown project");
            return Arc::default();
        };

        let key = Arc::clone(&resolved.name);
        let fs = Arc::clone(&self.fs);
        let built = self
            .entries
            .get_or_build(&key, move || {
                async move {
                    let loader = DocumentLoader::new(fs.as_ref(), &resolved.root);
                    let documents = loader
                        .load(
                            &resolved.config.document_patterns(),
                            &resolved.config.exclude_patterns(),
                        )
                        .await;
                    let index = ProjectIndex::from_documents(&documents);
                    tracing::debug!(
                        fragments = index.fragments.len(),
                        types = index.types.len(),
                        "project index built"
                    );
                    Ok(Arc::new(index))
                }
                .boxed()
            })
            .await;
        match built {
            Ok(index) => index,
            Err(never) => match never {},
        }
    }

    /// Evicts `project`'s index.
    pub fn invalidate(&self, project: &str) -> bool {
        let evicted = self.entries.invalidate(project);
        if evicted {
            tracing::debug!(project, "index evicted");
        }
        evicted
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn size_for_testing(&self) -> usize {
        self.entries.len()
    }
}
