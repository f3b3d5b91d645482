//! Persisted list of watched files.
//!
//! The store is a plain UTF-8 text file with one absolute path per line.
//! Order is preserved; blank and duplicate lines are passed through as-is
//! and left for the backup engine to tolerate.

use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Newline-delimited file of watched paths
#[derive(Debug, Clone)]
pub struct WatchList {
    path: PathBuf,
}

impl WatchList {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Open the store, creating an empty file if it does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self::new(path);
        store.ensure_exists()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty store file (and parent directories) if missing
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.is_file() {
            return Ok(());
        }
        if self.path.exists() {
            return Err(Error::WatchList {
                reason: format!("{} exists but is not a file", self.path.display()),
            });
        }

        info!("Watch list {} does not exist, creating ...", self.path.display());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, "")?;
        Ok(())
    }

    /// All entries in file order
    pub fn list_files(&self) -> Result<Vec<String>> {
        let content = fs::read_to_string(&self.path)?;
        Ok(content.lines().map(str::to_string).collect())
    }

    /// Append `file_path` unless it is already watched. Returns whether it was added.
    pub fn add_file(&self, file_path: &str) -> Result<bool> {
        let mut files = self.list_files()?;
        if files.iter().any(|f| f == file_path) {
            warn!(
                "Attempt to add file which is already being monitored ({}), ignoring ...",
                file_path
            );
            return Ok(false);
        }

        files.push(file_path.to_string());
        self.write_files(&files)?;
        info!("{} added to list of monitored files ...", file_path);
        Ok(true)
    }

    /// Remove the first occurrence of `file_path`. Returns whether it was found.
    pub fn remove_file(&self, file_path: &str) -> Result<bool> {
        let mut files = self.list_files()?;
        let Some(index) = files.iter().position(|f| f == file_path) else {
            warn!("Cannot remove non-existent file path {}, ignoring ...", file_path);
            return Ok(false);
        };

        files.remove(index);
        self.write_files(&files)?;
        info!("{} removed from list of monitored files ...", file_path);
        Ok(true)
    }

    fn write_files(&self, files: &[String]) -> Result<()> {
        let mut content = String::new();
        for file in files {
            content.push_str(file);
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        debug!("Wrote {} entries to {}", files.len(), self.path.display());
        Ok(())
    }
}
