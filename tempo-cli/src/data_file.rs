//! The JSON file the CLI keeps projects and frames in.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempo_core::store::InMemoryStore;

pub struct DataFile {
    path: PathBuf,
    pub store: InMemoryStore,
}

impl DataFile {
    /// Opens the data file, starting empty if it doesn't exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "data file missing, starting empty");
            return Ok(Self {
                path,
                store: InMemoryStore::new(),
            });
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read data file at {}", path.display()))?;
        let store: InMemoryStore = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse data file at {}", path.display()))?;
        Ok(Self { path, store })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the store back, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.store)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write data file at {}", self.path.display()))?;
        Ok(())
    }
}
