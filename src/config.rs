//! Compatibility-layer configuration.
//!
//! All tunable parameters for the socket client and the keyed store.
//! Values can be overridden from a JSON file or the environment by the
//! composition root.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default bound on the connect readiness wait.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 8000;

/// Default bound on `read`/`read_array` waiting for data.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5000;

/// Environment variable that overrides `config_dir`.
pub const CONFIG_DIR_ENV: &str = "HAMCLOCK_DIR";

/// Core shim configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShimConfig {
    // --- Store ---
    /// Working directory holding the `eeprom` file (default `$HOME/.hamclock`)
    pub config_dir: Option<PathBuf>,

    // --- Network ---
    /// Connect readiness-wait bound (milliseconds)
    pub connect_timeout_ms: u64,
    /// Default read-pending bound (milliseconds)
    pub read_timeout_ms: u64,

    // --- Diagnostics ---
    /// Socket client debug level (0 = quiet)
    pub net_debug: u8,
    /// Store debug level (0 = quiet)
    pub nvram_debug: u8,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            config_dir: None,

            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,

            net_debug: 0,
            nvram_debug: 0,
        }
    }
}

impl ShimConfig {
    /// Parse a JSON configuration document; missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, crate::error::Error> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|_| crate::error::Error::Config("malformed JSON configuration"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `HAMCLOCK_DIR` if set and non-empty.
    pub fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            self.config_dir = Some(PathBuf::from(dir));
        }
    }

    /// Range-check the timeouts.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        if !(100..=60_000).contains(&self.connect_timeout_ms) {
            return Err(crate::error::Error::Config(
                "connect_timeout_ms must be 100–60000",
            ));
        }
        if !(10..=60_000).contains(&self.read_timeout_ms) {
            return Err(crate::error::Error::Config(
                "read_timeout_ms must be 10–60000",
            ));
        }
        Ok(())
    }
}
