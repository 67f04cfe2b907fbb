use crate::fs::FileSystem;
use crate::patterns::{
    expand_braces, in_node_modules, normalize_path, resolve, split_negations, PathMatcher,
};
use apollo_compiler::ast;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// A document file that was read and parsed without errors.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub path: PathBuf,
    pub text: Arc<str>,
    pub ast: Arc<ast::Document>,
}

/// Loads the GraphQL documents matched by a project's include globs.
pub struct DocumentLoader<'a> {
    fs: &'a dyn FileSystem,
    root: &'a Path,
}

impl<'a> DocumentLoader<'a> {
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, root: &'a Path) -> Self {
        Self { fs, root }
    }

    /// Lists matching files in pattern order, each pattern's matches sorted.
    ///
    /// `!`-prefixed patterns and `exclude` remove files with gitignore
    /// semantics. Files under `node_modules` are never returned. Invalid or
    /// unresolvable patterns contribute nothing.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn find_files(&self, patterns: &[&str], exclude: &[&str]) -> Vec<PathBuf> {
        let (includes, negated) = split_negations(patterns);
        let excludes: Vec<&str> = negated.into_iter().chain(exclude.iter().copied()).collect();
        let matcher = PathMatcher::new(self.root, &[], &excludes);

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for pattern in includes {
            for expanded in expand_braces(pattern) {
                let full = resolve(self.root, &expanded);
                let matched = match self.fs.glob(&full.to_string_lossy()).await {
                    Ok(matched) => matched,
                    Err(e) => {
                        tracing::warn!(pattern, error = %e, "skipping unusable document pattern");
                        continue;
                    }
                };
                for path in matched {
                    let path = normalize_path(&path);
                    if in_node_modules(&path) || matcher.is_excluded(&path) {
                        continue;
                    }
                    if seen.insert(path.clone()) {
                        files.push(path);
                    }
                }
            }
        }
        tracing::debug!(files = files.len(), "document patterns resolved");
        files
    }

    /// Reads and parses every matching file.
    ///
    /// A file that cannot be read or has syntax errors is skipped.
    pub async fn load(&self, patterns: &[&str], exclude: &[&str]) -> Vec<ParsedDocument> {
        let start = Instant::now();
        let files = self.find_files(patterns, exclude).await;
        let matched = files.len();

        let mut documents = Vec::with_capacity(matched);
        for path in files {
            if let Some(document) = self.load_file(path).await {
                documents.push(document);
            }
        }

        tracing::info!(
            matched,
            loaded = documents.len(),
            skipped = matched - documents.len(),
            duration_ms = start.elapsed().as_millis(),
            "documents loaded"
        );
        documents
    }

    #[tracing::instrument(skip(self, path), fields(file = %path.display()), level = "debug")]
    async fn load_file(&self, path: PathBuf) -> Option<ParsedDocument> {
        let text = match self.fs.read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read document");
                return None;
            }
        };
        let text: Arc<str> = Arc::from(text);
        match ast::Document::parse(text.as_ref(), &path) {
            Ok(ast) => Some(ParsedDocument {
                path,
                text,
                ast: Arc::new(ast),
            }),
            Err(with_errors) => {
                tracing::warn!(
                    errors = with_errors.errors.len(),
                    "skipping document with syntax errors"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::OsFileSystem;
    use std::fs;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[tokio::test]
    async fn finds_files_in_pattern_order_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b/one.graphql", "fragment One on T { id }");
        write(dir.path(), "a/two.gql", "fragment Two on T { id }");
        write(dir.path(), "a/three.graphql", "fragment Three on T { id }");

        let loader = DocumentLoader::new(&OsFileSystem, dir.path());
        let files = loader
            .find_files(&["b/*.graphql", "./a/*.{graphql,gql}", "b/one.graphql"], &[])
            .await;

        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            [
                PathBuf::from("b/one.graphql"),
                PathBuf::from("a/three.graphql"),
                PathBuf::from("a/two.gql"),
            ]
        );
    }

    #[tokio::test]
    async fn negations_excludes_and_node_modules_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/keep.graphql", "fragment Keep on T { id }");
        write(dir.path(), "src/legacy/old.graphql", "fragment Old on T { id }");
        write(dir.path(), "src/generated/gen.graphql", "fragment Gen on T { id }");
        write(dir.path(), "node_modules/pkg/dep.graphql", "fragment Dep on T { id }");

        let loader = DocumentLoader::new(&OsFileSystem, dir.path());
        let files = loader
            .find_files(&["**/*.graphql", "!src/legacy/**"], &["src/generated/**"])
            .await;

        assert_eq!(files, [dir.path().join("src/keep.graphql")]);
    }

    #[tokio::test]
    async fn unparsable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.graphql", "fragment Good on T { id }");
        write(dir.path(), "bad.graphql", "fragment Bad on { ");

        let documents = DocumentLoader::new(&OsFileSystem, dir.path())
            .load(&["*.graphql"], &[])
            .await;

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].path, dir.path().join("good.graphql"));
        assert_eq!(documents[0].ast.definitions.len(), 1);
    }

    #[tokio::test]
    async fn missing_directories_and_empty_patterns_yield_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DocumentLoader::new(&OsFileSystem, dir.path());
        assert!(loader.load(&[], &[]).await.is_empty());
        assert!(loader.load(&["does/not/exist/**/*.graphql"], &[]).await.is_empty());
        assert!(loader.load(&["[unclosed"], &[]).await.is_empty());
    }
}
