//! Runtime settings: where the watch list lives, where backups go and how
//! often standalone mode runs a pass.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default watch-list file, relative to the working directory
pub const DEFAULT_WATCH_LIST: &str = "config.dat";

/// Default backup root, relative to the working directory
pub const DEFAULT_BACKUP_ROOT: &str = "backup";

/// Default standalone interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub watch_list: PathBuf,
    pub backup_root: PathBuf,
    pub interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watch_list: PathBuf::from(DEFAULT_WATCH_LIST),
            backup_root: PathBuf::from(DEFAULT_BACKUP_ROOT),
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

/// Values given on the command line; `None` keeps the loaded value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub watch_list: Option<PathBuf>,
    pub backup_root: Option<PathBuf>,
    pub interval_secs: Option<u64>,
}

impl Settings {
    /// Load settings from a TOML file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                let content = fs::read_to_string(path).map_err(|e| Error::Configuration {
                    reason: format!("Failed to read settings file {}: {}", path.display(), e),
                })?;
                let settings: Settings = toml::from_str(&content)?;
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(watch_list) = overrides.watch_list {
            info!("Config path set to {}", display_absolute(&watch_list));
            self.watch_list = watch_list;
        }
        if let Some(backup_root) = overrides.backup_root {
            info!("Backup root path set to {}", display_absolute(&backup_root));
            self.backup_root = backup_root;
        }
        if let Some(interval_secs) = overrides.interval_secs {
            self.interval_secs = interval_secs;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(Error::Configuration {
                reason: "Backup interval must be greater than 0 seconds".to_string(),
            });
        }
        if self.watch_list.as_os_str().is_empty() {
            return Err(Error::Configuration {
                reason: "Watch list location must not be empty".to_string(),
            });
        }
        if self.backup_root.as_os_str().is_empty() {
            return Err(Error::Configuration {
                reason: "Backup root location must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn display_absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
