use std::path::{Path, PathBuf};

use parimarket::adapter::outbound::sqlite::SqliteStore;
use tempfile::TempDir;

/// Temporary SQLite database file, removed with its directory on drop.
pub struct TempDb {
    dir: TempDir,
    path: PathBuf,
}

impl TempDb {
    pub fn create(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(format!("{name}.db"));
        Self { dir, path }
    }

    pub fn url(&self) -> String {
        self.path.display().to_string()
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Open (and migrate) a store over this file.
    pub fn open(&self) -> SqliteStore {
        SqliteStore::open(&self.url()).expect("open sqlite store")
    }
}
