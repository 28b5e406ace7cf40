//! Named non-volatile settings on top of a [`ByteStore`].
//!
//! Callers address settings by [`NvName`]; this module resolves the name to
//! a cookie-prefixed record and commits after every write. A read of a
//! record whose cookie is not [`NV_COOKIE`] returns `Ok(None)`, which is the
//! normal first-run outcome and means "use your default".
//!
//! Misuse (an expected length that disagrees with the table) and commit
//! failures come back as [`StoreError`]; the composition root treats them
//! as fatal.

pub mod table;
pub mod text_format;

use log::{debug, info};

use crate::adapters::eeprom::FileEeprom;
use crate::adapters::store_path::StorePaths;
use crate::config::ShimConfig;
use crate::debug::{DebugLevels, Subsystem};
use crate::error::StoreError;
use crate::ports::ByteStore;

pub use table::{
    COLOR_TABLE_RECORD, FLASH_SECTOR_SIZE, N_PATH_COLORS, NV_BASE, NV_COOKIE, NV_LAYOUT, NV_TABLE,
    NvLayout, NvName,
};

/// One path color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The two fixed color-table records stored at the end of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTable {
    A,
    B,
}

/// Keyed persistent store.
pub struct NvStore<B: ByteStore = FileEeprom> {
    backend: B,
    layout: NvLayout,
    debug: DebugLevels,
}

impl NvStore<FileEeprom> {
    /// Resolve the store path, migrate a legacy file, check the layout
    /// against [`FLASH_SECTOR_SIZE`] and open + lock + load the file.
    pub fn open(cfg: &ShimConfig, debug: DebugLevels) -> Result<Self, StoreError> {
        NV_LAYOUT.check_capacity(FLASH_SECTOR_SIZE)?;
        let paths = StorePaths::resolve(cfg)?;
        paths.migrate_legacy()?;
        let eeprom = FileEeprom::open(paths.current(), FLASH_SECTOR_SIZE, debug.clone())?;
        Self::with_backend(eeprom, debug)
    }
}

impl<B: ByteStore> NvStore<B> {
    /// Wrap an already-open backend. Fails if the table plus both color
    /// tables do not fit the backend.
    pub fn with_backend(backend: B, debug: DebugLevels) -> Result<Self, StoreError> {
        NV_LAYOUT.check_capacity(backend.capacity())?;
        info!(
            "nvram: {} slots, {} of {} bytes used",
            NvName::COUNT,
            NV_LAYOUT.required_bytes(),
            backend.capacity()
        );
        Ok(Self {
            backend,
            layout: NV_LAYOUT,
            debug,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Cookie address and declared length of `name`, after checking the
    /// caller's expectation. `expected_len == 0` skips the check.
    fn slot(&self, name: NvName, expected_len: usize) -> Result<(usize, usize), StoreError> {
        let declared = name.size();
        if expected_len != 0 && expected_len != declared {
            return Err(StoreError::LengthMismatch {
                name,
                expected: expected_len,
                declared,
            });
        }
        Ok((self.layout.offset(name), declared))
    }

    /// Write `bytes` to `name` and commit.
    ///
    /// With `expected_len == 0` (strings) a shorter payload is zero-padded
    /// to the slot; otherwise the payload must fill the slot exactly.
    pub fn write_named(
        &mut self,
        name: NvName,
        bytes: &[u8],
        expected_len: usize,
    ) -> Result<(), StoreError> {
        let (addr, len) = self.slot(name, expected_len)?;
        let fits = if expected_len == 0 {
            bytes.len() <= len
        } else {
            bytes.len() == len
        };
        if !fits {
            return Err(StoreError::LengthMismatch {
                name,
                expected: bytes.len(),
                declared: len,
            });
        }
        if self.debug.enabled(Subsystem::Nvram, 1) {
            debug!("nvram: write {:?} @ {} ({} bytes)", name, addr, bytes.len());
        }
        self.write_record(addr, bytes, len);
        self.backend.commit()
    }

    /// Read `name`. `Ok(None)` when the slot was never written.
    pub fn read_named(
        &self,
        name: NvName,
        expected_len: usize,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let (addr, len) = self.slot(name, expected_len)?;
        let found = self.read_record(addr, len);
        if self.debug.enabled(Subsystem::Nvram, 2) {
            debug!("nvram: read {:?} @ {} found={}", name, addr, found.is_some());
        }
        Ok(found)
    }

    /// Invalidate `name` by clearing its cookie, then commit.
    pub fn erase_named(&mut self, name: NvName) -> Result<(), StoreError> {
        let (addr, _) = self.slot(name, 0)?;
        self.backend.write(addr, 0);
        self.backend.commit()
    }

    fn write_record(&mut self, addr: usize, payload: &[u8], len: usize) {
        self.backend.write(addr, NV_COOKIE);
        for i in 0..len {
            let byte = payload.get(i).copied().unwrap_or(0);
            self.backend.write(addr + 1 + i, byte);
        }
    }

    fn read_record(&self, addr: usize, len: usize) -> Option<Vec<u8>> {
        if self.backend.read(addr) != NV_COOKIE {
            return None;
        }
        Some((0..len).map(|i| self.backend.read(addr + 1 + i)).collect())
    }

    fn read_fixed<const N: usize>(&self, name: NvName) -> Result<Option<[u8; N]>, StoreError> {
        Ok(self.read_named(name, N)?.map(|bytes| {
            let mut out = [0u8; N];
            out.copy_from_slice(&bytes);
            out
        }))
    }

    // ── Typed helpers (little-endian, fixed-length slots) ─────

    pub fn write_u8(&mut self, name: NvName, v: u8) -> Result<(), StoreError> {
        self.write_named(name, &[v], 1)
    }

    pub fn read_u8(&self, name: NvName) -> Result<Option<u8>, StoreError> {
        Ok(self.read_fixed::<1>(name)?.map(|b| b[0]))
    }

    pub fn write_u16(&mut self, name: NvName, v: u16) -> Result<(), StoreError> {
        self.write_named(name, &v.to_le_bytes(), 2)
    }

    pub fn read_u16(&self, name: NvName) -> Result<Option<u16>, StoreError> {
        Ok(self.read_fixed(name)?.map(u16::from_le_bytes))
    }

    pub fn write_u32(&mut self, name: NvName, v: u32) -> Result<(), StoreError> {
        self.write_named(name, &v.to_le_bytes(), 4)
    }

    pub fn read_u32(&self, name: NvName) -> Result<Option<u32>, StoreError> {
        Ok(self.read_fixed(name)?.map(u32::from_le_bytes))
    }

    pub fn write_i32(&mut self, name: NvName, v: i32) -> Result<(), StoreError> {
        self.write_named(name, &v.to_le_bytes(), 4)
    }

    pub fn read_i32(&self, name: NvName) -> Result<Option<i32>, StoreError> {
        Ok(self.read_fixed(name)?.map(i32::from_le_bytes))
    }

    pub fn write_f32(&mut self, name: NvName, v: f32) -> Result<(), StoreError> {
        self.write_named(name, &v.to_le_bytes(), 4)
    }

    pub fn read_f32(&self, name: NvName) -> Result<Option<f32>, StoreError> {
        Ok(self.read_fixed(name)?.map(f32::from_le_bytes))
    }

    /// Store `s` NUL-padded, truncated so a terminator always fits.
    pub fn write_string(&mut self, name: NvName, s: &str) -> Result<(), StoreError> {
        let max = name.size() - 1;
        let mut end = s.len().min(max);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.write_named(name, &s.as_bytes()[..end], 0)
    }

    pub fn read_string(&self, name: NvName) -> Result<Option<String>, StoreError> {
        Ok(self.read_named(name, 0)?.map(|bytes| {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        }))
    }

    // ── Color tables ──────────────────────────────────────────

    fn color_table_addr(&self, table: ColorTable) -> usize {
        let from_end = match table {
            ColorTable::A => 2,
            ColorTable::B => 1,
        };
        self.backend.capacity() - from_end * COLOR_TABLE_RECORD
    }

    pub fn write_color_table(
        &mut self,
        table: ColorTable,
        colors: &[Rgb; N_PATH_COLORS],
    ) -> Result<(), StoreError> {
        let addr = self.color_table_addr(table);
        let payload: Vec<u8> = colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
        if self.debug.enabled(Subsystem::Nvram, 1) {
            debug!("nvram: write color table {:?} @ {}", table, addr);
        }
        self.write_record(addr, &payload, payload.len());
        self.backend.commit()
    }

    /// `Ok(None)` when the table was never written.
    pub fn read_color_table(
        &self,
        table: ColorTable,
    ) -> Result<Option<[Rgb; N_PATH_COLORS]>, StoreError> {
        let addr = self.color_table_addr(table);
        Ok(self
            .read_record(addr, COLOR_TABLE_RECORD - 1)
            .map(|bytes| {
                let mut colors = [Rgb::default(); N_PATH_COLORS];
                for (c, rgb) in colors.iter_mut().zip(bytes.chunks_exact(3)) {
                    *c = Rgb::new(rgb[0], rgb[1], rgb[2]);
                }
                colors
            }))
    }
}
