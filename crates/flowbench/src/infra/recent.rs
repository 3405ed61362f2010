//! Recently-used file tracking persisted between sessions.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const STORE_DIR: &str = ".flowbench";
const STORE_FILE: &str = "recent.json";

/// One remembered file, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentEntry {
    pub path: String,
    pub opened_at: String,
}

/// Capped most-recent-first list of opened files, persisted as JSON under
/// `.flowbench/`.
#[derive(Debug, Clone)]
pub struct RecentFiles {
    path: PathBuf,
    entries: Vec<RecentEntry>,
    capacity: usize,
}

impl RecentFiles {
    /// Load the store rooted at the provided directory, creating an empty
    /// list when no file exists yet.
    pub fn load(root: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let path = root.into().join(STORE_DIR).join(STORE_FILE);
        let entries = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("failed to read recent files at {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("invalid recent-file data in {}", path.display()))?
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            entries,
            capacity,
        })
    }

    /// In-memory store that never touches disk. Used by tests and headless
    /// tooling.
    pub fn ephemeral(capacity: usize) -> Self {
        Self {
            path: PathBuf::new(),
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn entries(&self) -> &[RecentEntry] {
        &self.entries
    }

    /// Move `path` to the front of the list and persist the store.
    pub fn record(&mut self, path: &Path) -> Result<()> {
        let display = path.display().to_string();
        self.entries.retain(|entry| entry.path != display);
        let opened_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("failed to format recent-file timestamp")?;
        self.entries.insert(
            0,
            RecentEntry {
                path: display,
                opened_at,
            },
        );
        self.entries.truncate(self.capacity);
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        let dir = self.path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create store directory {}", dir.display()))?;
        let data =
            serde_json::to_string_pretty(&self.entries).context("failed to serialize recent files")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write recent files to {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_moves_existing_entry_to_front() -> Result<()> {
        let mut recent = RecentFiles::ephemeral(5);
        recent.record(Path::new("a.tfm"))?;
        recent.record(Path::new("b.job"))?;
        recent.record(Path::new("a.tfm"))?;

        let paths: Vec<&str> = recent.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.tfm", "b.job"]);
        Ok(())
    }

    #[test]
    fn list_is_capped() -> Result<()> {
        let mut recent = RecentFiles::ephemeral(2);
        recent.record(Path::new("a.tfm"))?;
        recent.record(Path::new("b.tfm"))?;
        recent.record(Path::new("c.tfm"))?;

        let paths: Vec<&str> = recent.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["c.tfm", "b.tfm"]);
        Ok(())
    }

    #[test]
    fn persists_and_reloads() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut recent = RecentFiles::load(temp.path(), 5)?;
        recent.record(Path::new("etl1.tfm"))?;

        let reloaded = RecentFiles::load(temp.path(), 5)?;
        assert_eq!(reloaded.entries().len(), 1);
        assert_eq!(reloaded.entries()[0].path, "etl1.tfm");
        Ok(())
    }
}
