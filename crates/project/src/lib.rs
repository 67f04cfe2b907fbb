//! Per-project GraphQL schema cache and fragment/type dependency index.
//!
//! [`ProjectCache`] owns two caches keyed by project name:
//!
//! - the project's [`Schema`](apollo_compiler::Schema), built from an
//!   introspected endpoint or from schema files on disk, extended with custom
//!   directive definitions;
//! - a [`ProjectIndex`] of every fragment and named type found in the
//!   project's documents, used to resolve the transitive dependencies of the
//!   document being edited.
//!
//! Entries are built lazily on first use, shared between concurrent callers,
//! and dropped when a file change makes them stale. Nothing is rebuilt until
//! it is asked for again.

mod cache;
pub mod dependencies;
mod document;
mod endpoint;
mod error;
mod fs;
mod index;
mod invalidation;
mod patterns;
mod schema;
mod schema_cache;
mod service;

use std::sync::Arc;

/// Name of a configured project.
pub type ProjectKey = Arc<str>;

pub use dependencies::{
    fragment_dependencies, fragment_dependencies_for_source, object_type_dependencies,
    object_type_dependencies_for_source, resolve_dependencies, FragmentSpreads, NamedTypes,
    ReferenceKind,
};
pub use document::{DocumentLoader, ParsedDocument};
pub use endpoint::{EndpointLoader, HttpEndpointLoader};
pub use error::{Result, SchemaError};
pub use fs::{FileSystem, OsFileSystem};
pub use index::{DefinitionMap, DefinitionRecord, ProjectIndex, ProjectIndexCache};
pub use invalidation::{evictions_for, Evictions, FileChange};
pub use schema::{build_schema, build_schema_from_introspection, BuiltSchema, SchemaBuilder, SourceText};
pub use schema_cache::{CachedSchemaEntry, ProjectSchemaCache, SourceKind};
pub use service::ProjectCache;
