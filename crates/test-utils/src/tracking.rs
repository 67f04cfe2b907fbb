//! File system access tracking for testing cache behavior.
//!
//! [`TrackingFileSystem`] wraps a real [`FileSystem`] and records every
//! operation, so tests can assert that a warm cache performs no I/O.
//!
//! ## Usage
//!
//! ```ignore
//! use graphql_test_utils::tracking::{ops, TrackingFileSystem};
//!
//! let fs = Arc::new(TrackingFileSystem::new());
//! let cache = ProjectCache::with_backends(provider, fs.clone(), endpoints);
//!
//! // Cold lookup reads the schema
//! let checkpoint = fs.checkpoint();
//! cache.get_schema("default").await?;
//! assert!(fs.count_since(ops::READ, checkpoint) >= 1);
//!
//! // Warm lookup is served from the cache
//! let checkpoint = fs.checkpoint();
//! cache.get_schema("default").await?;
//! assert_eq!(fs.count_since(ops::READ, checkpoint), 0);
//! ```

use async_trait::async_trait;
use graphql_project::{FileSystem, OsFileSystem};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Operation names to prevent typos in test assertions.
pub mod ops {
    pub const READ: &str = "read";
    pub const IS_DIR: &str = "is_dir";
    pub const WALK_DIR: &str = "walk_dir";
    pub const GLOB: &str = "glob";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsCall {
    pub op: &'static str,
    pub target: String,
}

#[derive(Default)]
struct CallLog {
    calls: Vec<FsCall>,
    counts: HashMap<&'static str, usize>,
}

impl CallLog {
    fn record(&mut self, op: &'static str, target: String) {
        self.calls.push(FsCall { op, target });
        *self.counts.entry(op).or_insert(0) += 1;
    }

    fn checkpoint(&self) -> usize {
        self.calls.len()
    }

    fn count_since(&self, op: &str, checkpoint: usize) -> usize {
        self.calls[checkpoint..]
            .iter()
            .filter(|call| call.op == op)
            .count()
    }

    fn calls_since(&self, checkpoint: usize) -> Vec<FsCall> {
        self.calls[checkpoint..].to_vec()
    }

    fn total_count(&self, op: &str) -> usize {
        self.counts.get(op).copied().unwrap_or(0)
    }

    fn reset(&mut self) {
        self.calls.clear();
        self.counts.clear();
    }
}

/// A [`FileSystem`] that records every call before delegating.
///
/// Each instance has its own log, keeping tests hermetic when run in
/// parallel.
#[derive(Clone)]
pub struct TrackingFileSystem {
    inner: Arc<dyn FileSystem>,
    log: Arc<Mutex<CallLog>>,
}

impl Default for TrackingFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingFileSystem {
    /// Tracks the real file system.
    pub fn new() -> Self {
        Self::wrapping(Arc::new(OsFileSystem))
    }

    pub fn wrapping(inner: Arc<dyn FileSystem>) -> Self {
        Self {
            inner,
            log: Arc::new(Mutex::new(CallLog::default())),
        }
    }

    fn record(&self, op: &'static str, target: impl Into<String>) {
        self.log
            .lock()
            .expect("CallLog mutex poisoned")
            .record(op, target.into());
    }

    fn with_log<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CallLog) -> R,
    {
        f(&self.log.lock().expect("CallLog mutex poisoned"))
    }

    /// Current log position for later comparison.
    pub fn checkpoint(&self) -> usize {
        self.with_log(CallLog::checkpoint)
    }

    /// Calls of `op` since `checkpoint`.
    pub fn count_since(&self, op: &str, checkpoint: usize) -> usize {
        self.with_log(|log| log.count_since(op, checkpoint))
    }

    pub fn calls_since(&self, checkpoint: usize) -> Vec<FsCall> {
        self.with_log(|log| log.calls_since(checkpoint))
    }

    /// Reads of `path` over the whole log.
    pub fn reads_of(&self, path: &Path) -> usize {
        let target = path.display().to_string();
        self.with_log(|log| {
            log.calls
                .iter()
                .filter(|call| call.op == ops::READ && call.target == target)
                .count()
        })
    }

    pub fn total_count(&self, op: &str) -> usize {
        self.with_log(|log| log.total_count(op))
    }

    pub fn reset(&self) {
        self.log.lock().expect("CallLog mutex poisoned").reset();
    }
}

#[async_trait]
impl FileSystem for TrackingFileSystem {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.record(ops::READ, path.display().to_string());
        self.inner.read_to_string(path).await
    }

    async fn is_dir(&self, path: &Path) -> bool {
        self.record(ops::IS_DIR, path.display().to_string());
        self.inner.is_dir(path).await
    }

    async fn walk_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.record(ops::WALK_DIR, dir.display().to_string());
        self.inner.walk_dir(dir).await
    }

    async fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>> {
        self.record(ops::GLOB, pattern);
        self.inner.glob(pattern).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_calls_since_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.graphql");
        std::fs::write(&file, "type Query { a: Int }").unwrap();

        let fs = TrackingFileSystem::new();
        fs.read_to_string(&file).await.unwrap();
        let checkpoint = fs.checkpoint();
        fs.read_to_string(&file).await.unwrap();
        fs.glob(&dir.path().join("*.graphql").to_string_lossy()).await.unwrap();

        assert_eq!(fs.count_since(ops::READ, checkpoint), 1);
        assert_eq!(fs.count_since(ops::GLOB, checkpoint), 1);
        assert_eq!(fs.total_count(ops::READ), 2);
        assert_eq!(fs.reads_of(&file), 2);

        fs.reset();
        assert_eq!(fs.checkpoint(), 0);
    }
}
