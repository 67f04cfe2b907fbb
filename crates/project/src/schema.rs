//! Building validated schemas from SDL sources.

use crate::fs::FileSystem;
use crate::patterns::{expand_braces, is_glob, resolve};
use crate::{Result, SchemaError};
use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use graphql_config::DirectiveSource;
use graphql_introspect::{introspection_to_sdl, IntrospectionSchema, BUILTIN_DIRECTIVES};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Extensions treated as schema files when a configured path is a directory.
const SCHEMA_EXTENSIONS: &[&str] = &["graphql", "graphqls", "gql"];

const INLINE_DIRECTIVES_LABEL: &str = "<customDirectives>";

/// One piece of SDL and where it came from.
#[derive(Debug, Clone)]
pub struct SourceText {
    /// File path, endpoint URL, or a label for inline configuration.
    pub path: PathBuf,
    pub text: String,
    /// Whether `path` names a file whose changes should evict the schema.
    pub on_disk: bool,
}

impl SourceText {
    #[must_use]
    pub fn file(path: PathBuf, text: String) -> Self {
        Self {
            path,
            text,
            on_disk: true,
        }
    }

    #[must_use]
    pub fn virtual_source(label: impl Into<PathBuf>, text: String) -> Self {
        Self {
            path: label.into(),
            text,
            on_disk: false,
        }
    }
}

/// A built schema and the files it was built from.
#[derive(Debug, Clone)]
pub struct BuiltSchema {
    pub schema: Valid<Schema>,
    pub source_paths: BTreeSet<PathBuf>,
}

/// Reads schema and directive sources for one project and builds them.
pub struct SchemaBuilder<'a> {
    fs: &'a dyn FileSystem,
    root: &'a Path,
}

impl<'a> SchemaBuilder<'a> {
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, root: &'a Path) -> Self {
        Self { fs, root }
    }

    /// Reads every schema file named by `paths`.
    ///
    /// Each entry may be a file, a directory (searched recursively for
    /// `.graphql`, `.graphqls` and `.gql` files) or a glob. An entry that
    /// matches nothing is an error.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn load_schema_sources(&self, paths: &[&str]) -> Result<Vec<SourceText>> {
        let mut seen = HashSet::new();
        let mut sources = Vec::new();
        for &configured in paths {
            for file in self.resolve_entry(configured).await? {
                if seen.insert(file.clone()) {
                    let text = self.read(&file).await?;
                    sources.push(SourceText::file(file, text));
                }
            }
        }
        tracing::debug!(files = sources.len(), "schema sources loaded");
        Ok(sources)
    }

    /// Reads custom directive definitions from files and inline SDL.
    pub async fn load_directive_sources(
        &self,
        directives: &[DirectiveSource],
    ) -> Result<Vec<SourceText>> {
        let mut sources = Vec::new();
        for directive in directives {
            match directive {
                DirectiveSource::Inline(sdl) => {
                    sources.push(SourceText::virtual_source(INLINE_DIRECTIVES_LABEL, sdl.clone()));
                }
                DirectiveSource::Path(configured) => {
                    for file in self.resolve_entry(configured).await? {
                        let text = self.read(&file).await?;
                        sources.push(SourceText::file(file, text));
                    }
                }
            }
        }
        Ok(sources)
    }

    async fn resolve_entry(&self, configured: &str) -> Result<Vec<PathBuf>> {
        let resolved = resolve(self.root, configured);
        let files = if is_glob(configured) {
            let mut files = Vec::new();
            for expanded in expand_braces(configured) {
                let pattern = resolve(self.root, &expanded);
                let matched = self
                    .fs
                    .glob(&pattern.to_string_lossy())
                    .await
                    .map_err(|e| load_error(&resolved, &e))?;
                files.extend(matched);
            }
            files
        } else if self.fs.is_dir(&resolved).await {
            self.fs
                .walk_dir(&resolved)
                .await
                .map_err(|e| load_error(&resolved, &e))?
                .into_iter()
                .filter(|path| has_schema_extension(path))
                .collect()
        } else {
            vec![resolved.clone()]
        };

        if files.is_empty() {
            return Err(SchemaError::SchemaLoad {
                path: resolved,
                message: "no schema files matched".to_string(),
            });
        }
        Ok(files)
    }

    async fn read(&self, path: &Path) -> Result<String> {
        self.fs
            .read_to_string(path)
            .await
            .map_err(|e| load_error(path, &e))
    }
}

fn load_error(path: &Path, error: &std::io::Error) -> SchemaError {
    SchemaError::SchemaLoad {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn has_schema_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCHEMA_EXTENSIONS.contains(&ext))
}

/// Builds and validates a schema from SDL sources plus directive extensions.
///
/// Only directive definitions are taken from `directives`. A directive that
/// redefines a built-in is a [`SchemaError::DirectiveConflict`]; one the
/// schema sources already define is left to the schema's definition.
#[tracing::instrument(skip_all, fields(sources = sources.len(), directive_sources = directives.len()))]
pub fn build_schema(sources: &[SourceText], directives: &[SourceText]) -> Result<BuiltSchema> {
    let mut builder = Schema::builder();
    let mut defined_directives = HashSet::new();
    let mut source_paths = BTreeSet::new();

    for source in sources {
        let document = parse(source)?;
        defined_directives.extend(document.definitions.iter().filter_map(|definition| {
            match definition {
                ast::Definition::DirectiveDefinition(directive) => {
                    Some(directive.name.as_str().to_string())
                }
                _ => None,
            }
        }));
        builder = builder.add_ast(&document);
        if source.on_disk {
            source_paths.insert(source.path.clone());
        }
    }

    for source in directives {
        let mut document = parse(source)?;
        let mut merged = Vec::new();
        for definition in document.definitions.drain(..) {
            let ast::Definition::DirectiveDefinition(directive) = &definition else {
                tracing::debug!(
                    path = %source.path.display(),
                    name = ?definition.name(),
                    "ignoring non-directive definition"
                );
                continue;
            };
            let name = directive.name.as_str();
            if BUILTIN_DIRECTIVES.contains(&name) {
                return Err(SchemaError::DirectiveConflict {
                    name: name.to_string(),
                    path: source.path.clone(),
                });
            }
            if !defined_directives.insert(name.to_string()) {
                tracing::debug!(directive = name, "schema already defines directive");
                continue;
            }
            merged.push(definition);
        }
        document.definitions = merged;
        builder = builder.add_ast(&document);
        if source.on_disk {
            source_paths.insert(source.path.clone());
        }
    }

    let schema = builder.build().map_err(|with_errors| SchemaError::Validation {
        message: with_errors.errors.to_string(),
    })?;
    let schema = schema.validate().map_err(|with_errors| SchemaError::Validation {
        message: with_errors.errors.to_string(),
    })?;

    tracing::debug!(
        types = schema.types.len(),
        directives = schema.directive_definitions.len(),
        "schema built"
    );
    Ok(BuiltSchema {
        schema,
        source_paths,
    })
}

/// Builds a schema from an introspection result, labelled with `url`.
pub fn build_schema_from_introspection(
    url: &str,
    introspection: &IntrospectionSchema,
    directives: &[SourceText],
) -> Result<BuiltSchema> {
    let sdl = introspection_to_sdl(introspection);
    build_schema(&[SourceText::virtual_source(url, sdl)], directives)
}

fn parse(source: &SourceText) -> Result<ast::Document> {
    ast::Document::parse(source.text.as_str(), &source.path).map_err(|with_errors| {
        SchemaError::Parse {
            path: source.path.clone(),
            message: with_errors.errors.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::OsFileSystem;
    use graphql_introspect::IntrospectionResponse;
    use std::fs;

    const SCHEMA: &str = "type Query { hero: Character }\ntype Character { name: String }";

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn inline(sdl: &str) -> SourceText {
        SourceText::virtual_source(INLINE_DIRECTIVES_LABEL, sdl.to_string())
    }

    #[tokio::test]
    async fn loads_files_directories_and_globs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "schema.graphql", "type Query { a: Int }");
        write(dir.path(), "types/b.graphqls", "type B { b: Int }");
        write(dir.path(), "types/nested/c.gql", "type C { c: Int }");
        write(dir.path(), "types/README.md", "not a schema");
        write(dir.path(), "ext/d.graphql", "type D { d: Int }");

        let builder = SchemaBuilder::new(&OsFileSystem, dir.path());
        let sources = builder
            .load_schema_sources(&["./schema.graphql", "types", "ext/*.{graphql,gql}"])
            .await
            .unwrap();

        let names: Vec<_> = sources
            .iter()
            .map(|s| s.path.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(
            names,
            ["schema.graphql", "types/b.graphqls", "types/nested/c.gql", "ext/d.graphql"]
        );
        assert!(sources.iter().all(|s| s.on_disk));
    }

    #[tokio::test]
    async fn unmatched_entries_are_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let builder = SchemaBuilder::new(&OsFileSystem, dir.path());

        let missing = builder.load_schema_sources(&["missing.graphql"]).await;
        assert!(matches!(missing, Err(SchemaError::SchemaLoad { .. })));

        let empty_glob = builder.load_schema_sources(&["schema/*.graphql"]).await;
        assert!(matches!(empty_glob, Err(SchemaError::SchemaLoad { .. })));
    }

    #[test]
    fn merges_custom_directives() {
        let built = build_schema(
            &[SourceText::virtual_source("schema.graphql", SCHEMA.to_string())],
            &[inline("directive @cached(ttl: Int) on FIELD | FIELD_DEFINITION")],
        )
        .unwrap();

        let cached = built.schema.directive_definitions.get("cached").unwrap();
        assert_eq!(cached.arguments.len(), 1);
        assert!(built.schema.types.contains_key("Character"));
        assert!(built.source_paths.is_empty());
    }

    #[test]
    fn builtin_directive_redefinition_conflicts() {
        let err = build_schema(
            &[SourceText::virtual_source("schema.graphql", SCHEMA.to_string())],
            &[inline("directive @include(if: Boolean!) on FIELD")],
        )
        .unwrap_err();

        assert!(
            matches!(&err, SchemaError::DirectiveConflict { name, .. } if name == "include"),
            "{err}"
        );
    }

    #[test]
    fn directive_already_in_schema_is_kept_once() {
        let schema = format!("{SCHEMA}\ndirective @auth on FIELD_DEFINITION");
        let built = build_schema(
            &[SourceText::virtual_source("schema.graphql", schema)],
            &[inline("directive @auth on FIELD_DEFINITION")],
        )
        .unwrap();
        assert!(built.schema.directive_definitions.contains_key("auth"));
    }

    #[test]
    fn directive_sources_contribute_only_directives() {
        let built = build_schema(
            &[SourceText::virtual_source("schema.graphql", SCHEMA.to_string())],
            &[SourceText::file(
                PathBuf::from("/repo/directives.graphql"),
                "directive @audit(reason: String) on FIELD_DEFINITION\n\
                 type Stray { id: ID }\n\
                 scalar Loose"
                    .to_string(),
            )],
        )
        .unwrap();

        assert!(built.schema.directive_definitions.contains_key("audit"));
        assert!(!built.schema.types.contains_key("Stray"));
        assert!(!built.schema.types.contains_key("Loose"));
        assert!(built
            .source_paths
            .contains(&PathBuf::from("/repo/directives.graphql")));
    }

    #[test]
    fn syntax_and_validation_failures_are_distinguished() {
        let parse_err = build_schema(
            &[SourceText::virtual_source("broken.graphql", "type Query {".to_string())],
            &[],
        )
        .unwrap_err();
        assert!(matches!(parse_err, SchemaError::Parse { .. }), "{parse_err}");

        let invalid = build_schema(
            &[SourceText::virtual_source(
                "invalid.graphql",
                "type Query { hero: Missing }".to_string(),
            )],
            &[],
        )
        .unwrap_err();
        assert!(matches!(invalid, SchemaError::Validation { .. }), "{invalid}");
    }

    #[test]
    fn records_only_on_disk_sources() {
        let built = build_schema(
            &[SourceText::file(PathBuf::from("/repo/schema.graphql"), SCHEMA.to_string())],
            &[
                SourceText::file(
                    PathBuf::from("/repo/directives.graphql"),
                    "directive @a on FIELD".to_string(),
                ),
                inline("directive @b on FIELD"),
            ],
        )
        .unwrap();
        assert_eq!(
            built.source_paths.into_iter().collect::<Vec<_>>(),
            [
                PathBuf::from("/repo/directives.graphql"),
                PathBuf::from("/repo/schema.graphql")
            ]
        );
    }

    #[test]
    fn builds_from_introspection() {
        let response: IntrospectionResponse = serde_json::from_value(serde_json::json!({
            "data": { "__schema": {
                "queryType": { "name": "Query" },
                "mutationType": null,
                "subscriptionType": null,
                "types": [
                    { "kind": "OBJECT", "name": "Query", "description": null, "interfaces": [],
                      "fields": [{ "name": "ping", "description": null, "args": [],
                                   "type": { "kind": "SCALAR", "name": "String", "ofType": null },
                                   "isDeprecated": false, "deprecationReason": null }] },
                    { "kind": "SCALAR", "name": "String", "description": null }
                ],
                "directives": [
                    { "name": "deprecated", "description": null, "locations": ["FIELD_DEFINITION"], "args": [] }
                ]
            } }
        }))
        .unwrap();

        let built = build_schema_from_introspection(
            "https://api.example.com/graphql",
            &response.into_schema().unwrap(),
            &[inline("directive @local on FIELD")],
        )
        .unwrap();
        assert!(built.schema.types.contains_key("Query"));
        assert!(built.schema.directive_definitions.contains_key("local"));
        assert!(built.source_paths.is_empty());
    }
}
