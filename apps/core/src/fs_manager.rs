use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// On-device directory layout. The host shell supplies the root (its
/// application-support directory); everything else hangs off it.
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// Main data directory (./data).
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Database directory (./data/db).
    pub fn db_dir(&self) -> PathBuf {
        self.data_dir().join("db")
    }

    /// SQLite file backing the key-value store.
    pub fn db_file(&self) -> PathBuf {
        self.db_dir().join("parkchat.sqlite")
    }

    /// Creates the data and db directories if they don't exist.
    pub fn init(&self) -> Result<(), std::io::Error> {
        for dir in [self.data_dir(), self.db_dir()] {
            if !dir.exists() {
                info!("Creating directory: {:?}", dir);
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}
