//! Store file location and one-time legacy migration.
//!
//! | Path                         | Role                                  |
//! |------------------------------|---------------------------------------|
//! | `<config_dir>/eeprom`        | current store (`config_dir` defaults to `$HOME/.hamclock`) |
//! | `$HOME/.hamclock_eeprom`     | legacy store, renamed into place once |
//!
//! Migration only applies to the default directory; an instance started
//! with its own directory never adopts the default instance's settings.

use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::ShimConfig;
use crate::error::StoreError;

const STORE_FILE: &str = "eeprom";
const DEFAULT_DIR: &str = ".hamclock";
const LEGACY_FILE: &str = ".hamclock_eeprom";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    dir: PathBuf,
    current: PathBuf,
    legacy: Option<PathBuf>,
}

impl StorePaths {
    /// Explicit locations; `legacy` of `None` disables migration.
    pub fn new(dir: impl Into<PathBuf>, legacy: Option<PathBuf>) -> Self {
        let dir = dir.into();
        let current = dir.join(STORE_FILE);
        Self {
            dir,
            current,
            legacy,
        }
    }

    /// Resolve from configuration and `$HOME`.
    pub fn resolve(cfg: &ShimConfig) -> Result<Self, StoreError> {
        if let Some(dir) = &cfg.config_dir {
            return Ok(Self::new(dir, None));
        }
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                StoreError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    "HOME is not set and no config directory was given",
                ))
            })?;
        Ok(Self::new(
            home.join(DEFAULT_DIR),
            Some(home.join(LEGACY_FILE)),
        ))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn current(&self) -> &Path {
        &self.current
    }

    /// Create the config directory and, if the current store is missing but
    /// a legacy one exists, rename it into place. Returns whether a file
    /// was migrated.
    pub fn migrate_legacy(&self) -> Result<bool, StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let Some(legacy) = &self.legacy else {
            return Ok(false);
        };
        if self.current.exists() || !legacy.exists() {
            return Ok(false);
        }
        std::fs::rename(legacy, &self.current)?;
        info!(
            "eeprom: migrated {} -> {}",
            legacy.display(),
            self.current.display()
        );
        Ok(true)
    }
}
