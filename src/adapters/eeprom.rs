//! EEPROM emulation adapter.
//!
//! Implements [`ByteStore`] for the HamClock settings image.
//!
//! - [`FileEeprom`]: the image lives in memory and is persisted to a text
//!   file (see [`text_format`](crate::nvram::text_format)) on every
//!   [`commit`](ByteStore::commit). The file is held under an exclusive
//!   advisory lock for the lifetime of the object, so a second HamClock
//!   pointed at the same directory fails fast instead of corrupting it.
//! - [`MemEeprom`]: in-memory backend for tests and tooling.
//!
//! Only `commit` is durable; `write` mutates the in-memory image.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{info, warn};

use crate::debug::{DebugLevels, Subsystem};
use crate::error::StoreError;
use crate::nvram::text_format::{accept_forward_only, parse_lines, write_image};
use crate::ports::ByteStore;

pub struct FileEeprom {
    path: PathBuf,
    file: File,
    image: Vec<u8>,
    debug: DebugLevels,
}

impl FileEeprom {
    /// Open (creating if missing) and lock `path`, then load its contents
    /// into a zero-filled image of `capacity` bytes.
    ///
    /// Returns `Err(StoreError::Locked)` when another process (or another
    /// handle in this one) already owns the file.
    pub fn open(path: &Path, capacity: usize, debug: DebugLevels) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        adjust_ownership(path);

        file.try_lock_exclusive().map_err(|_| StoreError::Locked {
            path: path.display().to_string(),
        })?;

        let mut raw = Vec::new();
        (&file).read_to_end(&mut raw)?;
        let text = String::from_utf8_lossy(&raw);

        // Out-of-range entries must not raise the forward-only watermark.
        let in_range = parse_lines(&text).into_iter().filter(|&(addr, _)| {
            let ok = (addr as usize) < capacity;
            if !ok {
                warn!("eeprom: {:08X} beyond capacity {}, ignored", addr, capacity);
            }
            ok
        });

        let mut image = vec![0u8; capacity];
        let mut loaded = 0usize;
        for (addr, value) in accept_forward_only(in_range) {
            image[addr as usize] = value;
            loaded += 1;
        }

        info!(
            "eeprom: {} opened, {} of {} bytes loaded",
            path.display(),
            loaded,
            capacity
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            image,
            debug,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteStore for FileEeprom {
    fn capacity(&self) -> usize {
        self.image.len()
    }

    fn read(&self, addr: usize) -> u8 {
        match self.image.get(addr) {
            Some(&v) => v,
            None => {
                warn!("eeprom: read address {} out of range", addr);
                0
            }
        }
    }

    fn write(&mut self, addr: usize, value: u8) {
        match self.image.get_mut(addr) {
            Some(slot) => *slot = value,
            None => warn!("eeprom: write address {} out of range, dropped", addr),
        }
    }

    /// Truncate, rewind and rewrite the whole image.
    fn commit(&mut self) -> Result<(), StoreError> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        let mut out = BufWriter::new(&self.file);
        write_image(&self.image, &mut out)?;
        out.flush()?;
        if self.debug.enabled(Subsystem::Nvram, 1) {
            info!("eeprom: committed {} bytes to {}", self.image.len(), self.path.display());
        }
        Ok(())
    }
}

/// When running under sudo, hand the file back to the invoking user so a
/// later unprivileged run can still open it. Failure is logged only.
fn adjust_ownership(path: &Path) {
    let id = |var: &str| std::env::var(var).ok().and_then(|v| v.parse::<u32>().ok());
    if let (Some(uid), Some(gid)) = (id("SUDO_UID"), id("SUDO_GID")) {
        if let Err(e) = std::os::unix::fs::chown(path, Some(uid), Some(gid)) {
            warn!("eeprom: chown {} to {}:{} failed: {}", path.display(), uid, gid, e);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// In-memory backend
// ───────────────────────────────────────────────────────────────

/// Volatile [`ByteStore`]; counts commits so tests can assert on them.
#[derive(Debug, Clone)]
pub struct MemEeprom {
    image: Vec<u8>,
    commits: usize,
}

impl MemEeprom {
    pub fn new(capacity: usize) -> Self {
        Self {
            image: vec![0u8; capacity],
            commits: 0,
        }
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }
}

impl ByteStore for MemEeprom {
    fn capacity(&self) -> usize {
        self.image.len()
    }

    fn read(&self, addr: usize) -> u8 {
        self.image.get(addr).copied().unwrap_or(0)
    }

    fn write(&mut self, addr: usize, value: u8) {
        if let Some(slot) = self.image.get_mut(addr) {
            *slot = value;
        }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(path: &Path) -> FileEeprom {
        FileEeprom::open(path, 64, DebugLevels::new()).unwrap()
    }

    #[test]
    fn creates_missing_file_zero_filled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom");
        let ee = open(&path);
        assert!(path.exists());
        assert_eq!(ee.capacity(), 64);
        assert!((0..64).all(|a| ee.read(a) == 0));
    }

    #[test]
    fn out_of_range_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let mut ee = open(&dir.path().join("eeprom"));
        ee.write(64, 0xFF);
        assert_eq!(ee.read(64), 0);
        assert_eq!(ee.read(usize::MAX), 0);
    }

    #[test]
    fn writes_are_not_durable_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom");
        {
            let mut ee = open(&path);
            ee.write(3, 0x42);
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        {
            let mut ee = open(&path);
            assert_eq!(ee.read(3), 0);
            ee.write(3, 0x42);
            ee.commit().unwrap();
        }
        assert_eq!(open(&path).read(3), 0x42);
    }

    #[test]
    fn commit_rewrites_every_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom");
        let mut ee = open(&path);
        ee.write(0, 0xAB);
        ee.commit().unwrap();
        ee.commit().unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 64);
        assert_eq!(text.lines().next(), Some("00000000 AB"));
        assert_eq!(text.lines().last(), Some("0000003F 00"));
    }

    #[test]
    fn second_open_is_locked_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom");
        let _owner = open(&path);
        let second = FileEeprom::open(&path, 64, DebugLevels::new());
        assert!(matches!(second, Err(StoreError::Locked { .. })));
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom");
        drop(open(&path));
        assert!(FileEeprom::open(&path, 64, DebugLevels::new()).is_ok());
    }

    #[test]
    fn entries_beyond_capacity_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom");
        std::fs::write(&path, "00000001 11\n00001000 22\n").unwrap();
        let ee = open(&path);
        assert_eq!(ee.read(1), 0x11);
    }

    #[test]
    fn out_of_range_line_does_not_hide_later_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom");
        std::fs::write(&path, "00000036 01\nFFFFFFFF 00\n00000037 5A\n00000038 42\n").unwrap();
        let ee = FileEeprom::open(&path, 4096, DebugLevels::new()).unwrap();
        assert_eq!(ee.read(0x36), 0x01);
        assert_eq!(ee.read(0x37), 0x5A);
        assert_eq!(ee.read(0x38), 0x42);
    }

    #[test]
    fn mem_eeprom_counts_commits() {
        let mut m = MemEeprom::new(8);
        m.write(7, 1);
        m.write(8, 1);
        m.commit().unwrap();
        assert_eq!(m.image(), &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(m.commit_count(), 1);
    }
}
