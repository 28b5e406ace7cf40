//! Per-subsystem diagnostic levels.
//!
//! Components hold a cloned [`DebugLevels`] handle and only read it; the
//! composition root (or a settings screen) is the single writer. Levels gate
//! chatty `log` output and never change behaviour.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::config::ShimConfig;

/// Subsystems with their own diagnostic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Subsystem {
    /// Socket client.
    Net = 0,
    /// EEPROM emulation and named slots.
    Nvram = 1,
}

const N_SUBSYSTEMS: usize = 2;

/// Shared, cheaply cloneable level table.
#[derive(Debug, Clone, Default)]
pub struct DebugLevels {
    levels: Arc<[AtomicU8; N_SUBSYSTEMS]>,
}

impl DebugLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table from configuration.
    pub fn from_config(cfg: &ShimConfig) -> Self {
        let levels = Self::new();
        levels.set(Subsystem::Net, cfg.net_debug);
        levels.set(Subsystem::Nvram, cfg.nvram_debug);
        levels
    }

    pub fn set(&self, subsystem: Subsystem, level: u8) {
        self.levels[subsystem as usize].store(level, Ordering::Relaxed);
    }

    pub fn level(&self, subsystem: Subsystem) -> u8 {
        self.levels[subsystem as usize].load(Ordering::Relaxed)
    }

    /// True when `subsystem` is configured at `level` or higher.
    pub fn enabled(&self, subsystem: Subsystem, level: u8) -> bool {
        self.level(subsystem) >= level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_quiet_but_level_zero_always_on() {
        let d = DebugLevels::new();
        assert!(d.enabled(Subsystem::Net, 0));
        assert!(!d.enabled(Subsystem::Net, 1));
        assert!(!d.enabled(Subsystem::Nvram, 1));
    }

    #[test]
    fn clones_observe_writes() {
        let d = DebugLevels::new();
        let reader = d.clone();
        d.set(Subsystem::Nvram, 2);
        assert!(reader.enabled(Subsystem::Nvram, 2));
        assert!(!reader.enabled(Subsystem::Nvram, 3));
        assert!(!reader.enabled(Subsystem::Net, 1));
    }

    #[test]
    fn from_config_seeds_levels() {
        let cfg = ShimConfig {
            net_debug: 3,
            ..Default::default()
        };
        let d = DebugLevels::from_config(&cfg);
        assert_eq!(d.level(Subsystem::Net), 3);
        assert_eq!(d.level(Subsystem::Nvram), 0);
    }
}
