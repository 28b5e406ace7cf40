//! Port traits: the boundary between HamClock features and the host.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ feature code (downloader, DX cluster, setup)
//! ```
//!
//! The same feature code runs against real sockets and files on a POSIX
//! host, or against in-memory fakes in tests.

// ───────────────────────────────────────────────────────────────
// Transport port (stream connection to a remote host)
// ───────────────────────────────────────────────────────────────

/// Synchronous, connection-oriented byte stream with Arduino `Client`
/// semantics: failures degrade the connection and are reported through
/// `bool`/`Option`/short counts rather than errors.
pub trait Transport {
    /// Open a connection to `host:port`. Returns `false` on any failure.
    fn connect(&mut self, host: &str, port: u16) -> bool;

    /// Whether a descriptor is currently held (no liveness probe).
    fn connected(&self) -> bool;

    /// Whether at least one byte can be read within `timeout_ms`.
    fn available(&mut self, timeout_ms: u64) -> bool;

    /// Next byte, or `None` on EOF/timeout.
    fn read(&mut self) -> Option<u8>;

    /// Copy currently buffered bytes into `buf`; returns the count.
    fn read_array(&mut self, buf: &mut [u8]) -> usize;

    /// Send all of `data`; a short count means the connection was lost.
    fn write(&mut self, data: &[u8]) -> usize;

    /// Close the connection. Safe to call repeatedly.
    fn stop(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Byte store port (EEPROM emulation)
// ───────────────────────────────────────────────────────────────

/// Fixed-size byte array that can be made durable with [`commit`](Self::commit).
///
/// Out-of-range accesses are tolerated: reads yield 0 and writes are
/// dropped. Only `commit` reports failure.
pub trait ByteStore {
    /// Total addressable bytes.
    fn capacity(&self) -> usize;

    fn read(&self, addr: usize) -> u8;

    fn write(&mut self, addr: usize, value: u8);

    /// Persist the whole image.
    fn commit(&mut self) -> Result<(), crate::error::StoreError>;
}
