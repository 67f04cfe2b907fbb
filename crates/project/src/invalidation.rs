//! Deciding which cached entries a batch of file changes makes stale.

use crate::patterns::{in_node_modules, normalize_path, split_negations, PathMatcher};
use graphql_config::{DirectiveSource, ProjectConfig};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One changed file as reported by a file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Absolute, or relative to the watched root.
    pub name: PathBuf,
    pub exists: bool,
    pub size: Option<u64>,
    pub mtime: Option<SystemTime>,
    /// The watcher lost track of the file system and everything may have
    /// changed.
    pub is_fresh_instance: bool,
}

impl FileChange {
    #[must_use]
    pub fn new(name: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            exists: true,
            size: None,
            mtime: None,
            is_fresh_instance: false,
        }
    }

    #[must_use]
    pub fn removed(name: impl Into<PathBuf>) -> Self {
        Self {
            exists: false,
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn fresh_instance() -> Self {
        Self {
            is_fresh_instance: true,
            ..Self::new(PathBuf::new())
        }
    }

    /// Converts a `notify` event into one change per affected path.
    ///
    /// Size and modification time are read from the file system at
    /// conversion time.
    #[must_use]
    pub fn from_notify_event(event: &notify::Event) -> Vec<Self> {
        let rescan = event.need_rescan();
        if event.paths.is_empty() {
            return if rescan {
                vec![Self::fresh_instance()]
            } else {
                Vec::new()
            };
        }

        let removed = matches!(event.kind, notify::EventKind::Remove(_));
        event
            .paths
            .iter()
            .map(|path| {
                let metadata = if removed {
                    None
                } else {
                    std::fs::metadata(path).ok()
                };
                Self {
                    name: path.clone(),
                    exists: metadata.is_some(),
                    size: metadata.as_ref().map(std::fs::Metadata::len),
                    mtime: metadata.and_then(|m| m.modified().ok()),
                    is_fresh_instance: rescan,
                }
            })
            .collect()
    }
}

/// Which of a project's cached entries to drop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evictions {
    pub schema: bool,
    pub index: bool,
}

impl Evictions {
    #[must_use]
    pub fn any(self) -> bool {
        self.schema || self.index
    }

    fn all(self) -> bool {
        self.schema && self.index
    }
}

/// Decides what `changes` invalidate for one project.
///
/// The schema is stale when a change touches a configured schema path, a
/// custom directive file, or any file in `source_paths` (the files the
/// cached schema was built from). The index is stale when a change matches
/// the document patterns and survives their exclusions.
#[must_use]
pub fn evictions_for(
    changes: &[FileChange],
    root: &Path,
    config: &ProjectConfig,
    source_paths: Option<&BTreeSet<PathBuf>>,
) -> Evictions {
    let mut evictions = Evictions::default();
    if changes.is_empty() {
        return evictions;
    }
    if changes.iter().any(|change| change.is_fresh_instance) {
        return Evictions {
            schema: true,
            index: true,
        };
    }

    let mut schema_paths = config.schema_paths();
    let directives = config.custom_directives();
    schema_paths.extend(directives.iter().filter_map(|directive| match directive {
        DirectiveSource::Path(path) => Some(path.as_str()),
        DirectiveSource::Inline(_) => None,
    }));
    let schema = PathMatcher::new(root, &schema_paths, &[]);

    let (includes, negated) = split_negations(&config.document_patterns());
    let mut excludes = negated;
    excludes.extend(config.exclude_patterns());
    let documents = PathMatcher::new(root, &includes, &excludes);

    for change in changes {
        let path = normalize_path(&root.join(&change.name));
        if !evictions.schema {
            evictions.schema = schema.matches(&path)
                || source_paths.is_some_and(|sources| sources.contains(&path));
        }
        if !evictions.index && !documents.is_empty() {
            evictions.index = !in_node_modules(&path) && documents.matches(&path);
        }
        if evictions.all() {
            break;
        }
    }
    evictions
}
