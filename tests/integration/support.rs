//! Shared fixtures.

use std::path::Path;

use hamclock_shim::{DebugLevels, NvStore, ShimConfig};
use tempfile::TempDir;

/// Config pointing at a fresh temporary directory.
pub fn temp_config() -> (TempDir, ShimConfig) {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = ShimConfig {
        config_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    (dir, cfg)
}

pub fn open_store(cfg: &ShimConfig) -> NvStore {
    NvStore::open(cfg, DebugLevels::new()).expect("open store")
}

pub fn store_file(dir: &Path) -> std::path::PathBuf {
    dir.join("eeprom")
}
