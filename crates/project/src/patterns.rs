//! Resolution and matching of configured path patterns.
//!
//! Configured paths are relative to the project root and may be plain files,
//! directories, or globs with `{a,b}` brace groups. Document patterns may be
//! negated with a leading `!`.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Component, Path, PathBuf};

const GLOB_META: &[char] = &['*', '?', '[', '{'];

const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Expands `{a,b}` groups, including several groups in one pattern.
pub(crate) fn expand_braces(pattern: &str) -> Vec<String> {
    let (Some(start), Some(end)) = (pattern.find('{'), pattern.find('}')) else {
        return vec![pattern.to_string()];
    };
    if end < start {
        return vec![pattern.to_string()];
    }
    let (before, after) = (&pattern[..start], &pattern[end + 1..]);
    pattern[start + 1..end]
        .split(',')
        .flat_map(|option| expand_braces(&format!("{before}{}{after}", option.trim())))
        .collect()
}

/// Drops `.` components so `./src/a.graphql` and `src/a.graphql` compare equal.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Joins a configured path onto the project root.
pub(crate) fn resolve(root: &Path, configured: &str) -> PathBuf {
    normalize_path(&root.join(configured.trim()))
}

pub(crate) fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

pub(crate) fn in_node_modules(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == "node_modules")
}

#[derive(Debug)]
enum Entry {
    /// A file, or a directory matching everything beneath it.
    Literal(PathBuf),
    Glob(glob::Pattern),
}

impl Entry {
    fn matches(&self, path: &Path) -> bool {
        match self {
            Self::Literal(literal) => path.starts_with(literal),
            Self::Glob(pattern) => pattern.matches_path_with(path, MATCH_OPTIONS),
        }
    }
}

/// Decides whether a changed path falls under a set of configured paths.
#[derive(Debug)]
pub(crate) struct PathMatcher {
    root: PathBuf,
    entries: Vec<Entry>,
    excluded: Option<Gitignore>,
}

impl PathMatcher {
    /// `excludes` use gitignore syntax and are matched relative to `root`.
    /// Unusable patterns are logged and ignored.
    pub(crate) fn new(root: &Path, includes: &[&str], excludes: &[&str]) -> Self {
        let mut entries = Vec::new();
        for &configured in includes {
            for expanded in expand_braces(configured) {
                let resolved = resolve(root, &expanded);
                if !is_glob(&expanded) {
                    entries.push(Entry::Literal(resolved));
                    continue;
                }
                match glob::Pattern::new(&resolved.to_string_lossy()) {
                    Ok(pattern) => entries.push(Entry::Glob(pattern)),
                    Err(e) => tracing::warn!(pattern = configured, error = %e, "ignoring invalid glob"),
                }
            }
        }
        Self {
            root: root.to_path_buf(),
            entries,
            excluded: build_excludes(root, excludes),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn matches(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        !self.is_excluded(&path) && self.entries.iter().any(|entry| entry.matches(&path))
    }

    pub(crate) fn is_excluded(&self, path: &Path) -> bool {
        let Some(excluded) = &self.excluded else {
            return false;
        };
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        excluded
            .matched_path_or_any_parents(relative, false)
            .is_ignore()
    }
}

fn build_excludes(root: &Path, excludes: &[&str]) -> Option<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);
    let mut any = false;
    for &pattern in excludes {
        for expanded in expand_braces(pattern.trim()) {
            let line = expanded.strip_prefix("./").unwrap_or(&expanded);
            if let Err(e) = builder.add_line(None, line) {
                tracing::warn!(pattern, error = %e, "ignoring invalid exclude pattern");
                continue;
            }
            any = true;
        }
    }
    if !any {
        return None;
    }
    match builder.build() {
        Ok(gitignore) => Some(gitignore),
        Err(e) => {
            tracing::warn!(error = %e, "failed to build exclude matcher");
            None
        }
    }
}

/// Splits document patterns into includes and `!`-negated excludes.
pub(crate) fn split_negations<'a>(patterns: &[&'a str]) -> (Vec<&'a str>, Vec<&'a str>) {
    let mut includes = Vec::new();
    let mut negated = Vec::new();
    for pattern in patterns {
        match pattern.trim().strip_prefix('!') {
            Some(rest) => negated.push(rest),
            None => includes.push(*pattern),
        }
    }
    (includes, negated)
}
