//! Temporary on-disk projects.

use graphql_config::WorkspaceConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const CONFIG_FILE: &str = ".graphqlrc.yml";

/// A workspace in a temporary directory, removed on drop.
///
/// ```ignore
/// let project = TestProject::new()
///     .config("schema: schema.graphql\ndocuments: src/**/*.graphql")
///     .file("schema.graphql", fixtures::SCHEMA);
/// let cache = ProjectCache::new(project.provider());
/// ```
pub struct TestProject {
    dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Writes the workspace config file.
    #[must_use]
    pub fn config(self, yaml: &str) -> Self {
        self.write(CONFIG_FILE, yaml);
        self
    }

    #[must_use]
    pub fn file(self, relative: &str, contents: &str) -> Self {
        self.write(relative, contents);
        self
    }

    /// Creates or overwrites a file, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::fs::write(&path, contents).expect("failed to write file");
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.path(relative)).expect("failed to remove file");
    }

    /// Loads the config file written with [`Self::config`].
    pub fn workspace(&self) -> WorkspaceConfig {
        WorkspaceConfig::discover(self.root())
            .expect("invalid test config")
            .expect("no config file written")
    }

    pub fn provider(&self) -> Arc<WorkspaceConfig> {
        Arc::new(self.workspace())
    }
}
