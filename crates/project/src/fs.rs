//! Read-only filesystem access used by schema builds and index scans.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem operations needed to materialize schemas and indexes.
///
/// Every listing method returns paths in sorted order so builds are
/// deterministic for a fixed snapshot.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    async fn is_dir(&self, path: &Path) -> bool;

    /// Regular files below `dir`, recursively.
    async fn walk_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Regular files matching an absolute glob pattern.
    async fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>>;
}

/// [`FileSystem`] backed by the real disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

#[async_trait]
impl FileSystem for OsFileSystem {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .is_ok_and(|metadata| metadata.is_dir())
    }

    async fn walk_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            for entry in walkdir::WalkDir::new(&dir).sort_by_file_name() {
                let entry = entry.map_err(io::Error::other)?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            Ok(files)
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let pattern = pattern.to_string();
        tokio::task::spawn_blocking(move || {
            let paths = glob::glob(&pattern)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            let mut files: Vec<PathBuf> = paths
                .filter_map(|entry| match entry {
                    Ok(path) => Some(path),
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping unreadable glob entry");
                        None
                    }
                })
                .filter(|path| path.is_file())
                .collect();
            files.sort();
            Ok(files)
        })
        .await
        .map_err(io::Error::other)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn glob_and_walk_return_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("schema/nested")).unwrap();
        fs::write(dir.path().join("schema/b.graphql"), "type B").unwrap();
        fs::write(dir.path().join("schema/a.graphql"), "type A").unwrap();
        fs::write(dir.path().join("schema/nested/c.graphql"), "type C").unwrap();

        let fs_impl = OsFileSystem;
        let pattern = format!("{}/schema/*.graphql", dir.path().display());
        let globbed = fs_impl.glob(&pattern).await.unwrap();
        assert_eq!(
            globbed,
            [
                dir.path().join("schema/a.graphql"),
                dir.path().join("schema/b.graphql")
            ]
        );

        let walked = fs_impl.walk_dir(&dir.path().join("schema")).await.unwrap();
        assert_eq!(walked.len(), 3);
        assert!(fs_impl.is_dir(&dir.path().join("schema")).await);
        assert!(!fs_impl.is_dir(&dir.path().join("schema/a.graphql")).await);
    }

    #[tokio::test]
    async fn invalid_glob_is_an_input_error() {
        let err = OsFileSystem.glob("/tmp/[").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
