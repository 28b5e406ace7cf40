//! Arduino `WiFiClient` over a POSIX TCP socket.
//!
//! Implements [`Transport`] so feature code written against the Arduino
//! client API runs unchanged on a Linux host.
//!
//! ## Connection model
//!
//! 1. `connect()` resolves the host, opens a non-blocking socket and issues
//!    `connect(2)`. If the connection is in progress it waits (bounded, 8 s
//!    by default) for read or write readiness, then checks `SO_ERROR`: a
//!    socket can turn writable while still carrying a refused/unreachable
//!    error. On success the socket is switched back to blocking mode.
//! 2. Reads go through a 1 KiB peek buffer filled by at most one `recv(2)`
//!    per `available()` call, so byte-at-a-time readers do not cost a
//!    syscall per byte.
//! 3. Writes loop until everything is sent. Broken pipes surface as errors
//!    (`MSG_NOSIGNAL` / `SO_NOSIGPIPE`), never as a process signal.
//! 4. Any EOF or hard error drops the descriptor; the client is then
//!    unconnected until the caller connects again. Nothing is retried here.

mod posix;

use std::io;
use std::net::IpAddr;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use log::{debug, info, warn};

use crate::config::{DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_READ_TIMEOUT_MS, ShimConfig};
use crate::debug::{DebugLevels, Subsystem};
use crate::error::SocketError;
use crate::ports::Transport;

/// Peek buffer size.
pub const PEEK_CAPACITY: usize = 1024;

// ───────────────────────────────────────────────────────────────
// Readiness seam
// ───────────────────────────────────────────────────────────────

/// The two queries that complete a non-blocking connect.
pub trait Readiness {
    /// Wait up to `timeout_ms` for read or write readiness.
    /// `Ok(false)` on timeout.
    fn wait_connected(&self, fd: BorrowedFd<'_>, timeout_ms: u64) -> io::Result<bool>;

    /// Pending socket error (`SO_ERROR`); 0 when none.
    fn pending_error(&self, fd: BorrowedFd<'_>) -> io::Result<i32>;
}

/// `poll(2)` + `getsockopt(SO_ERROR)`.
pub struct PosixReadiness;

impl Readiness for PosixReadiness {
    fn wait_connected(&self, fd: BorrowedFd<'_>, timeout_ms: u64) -> io::Result<bool> {
        Ok(posix::poll(fd, libc::POLLIN | libc::POLLOUT, timeout_ms)? != 0)
    }

    fn pending_error(&self, fd: BorrowedFd<'_>) -> io::Result<i32> {
        posix::pending_error(fd)
    }
}

/// Finish an in-progress connect: bounded wait, then verify `SO_ERROR`.
pub fn await_connect<R: Readiness>(
    readiness: &R,
    fd: BorrowedFd<'_>,
    timeout_ms: u64,
) -> Result<(), SocketError> {
    if !readiness
        .wait_connected(fd, timeout_ms)
        .map_err(SocketError::Connect)?
    {
        return Err(SocketError::Timeout { ms: timeout_ms });
    }
    match readiness.pending_error(fd).map_err(SocketError::Connect)? {
        0 => Ok(()),
        code => Err(SocketError::Connect(io::Error::from_raw_os_error(code))),
    }
}

// ───────────────────────────────────────────────────────────────
// WifiClient
// ───────────────────────────────────────────────────────────────

/// One TCP connection with Arduino `Client` semantics.
pub struct WifiClient {
    fd: Option<OwnedFd>,
    peek: heapless::Vec<u8, PEEK_CAPACITY>,
    cursor: usize,
    connect_timeout_ms: u64,
    read_timeout_ms: u64,
    debug: DebugLevels,
}

impl Default for WifiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiClient {
    /// Unconnected client with default timeouts.
    pub fn new() -> Self {
        Self {
            fd: None,
            peek: heapless::Vec::new(),
            cursor: 0,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            debug: DebugLevels::new(),
        }
    }

    /// Unconnected client using the configured timeouts and debug levels.
    pub fn from_config(cfg: &ShimConfig, debug: DebugLevels) -> Self {
        Self::new()
            .with_timeouts(cfg.connect_timeout_ms, cfg.read_timeout_ms)
            .with_debug(debug)
    }

    /// Adopt an already-open descriptor, e.g. from `accept(2)`.
    pub fn from_fd(fd: OwnedFd) -> Self {
        let mut client = Self::new();
        client.fd = Some(fd);
        client
    }

    #[must_use]
    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: DebugLevels) -> Self {
        self.debug = debug;
        self
    }

    fn chatty(&self, level: u8) -> bool {
        self.debug.enabled(Subsystem::Net, level)
    }

    fn reset_peek(&mut self) {
        self.peek.clear();
        self.cursor = 0;
    }

    fn buffered(&self) -> usize {
        self.peek.len() - self.cursor
    }

    // ── Connect ───────────────────────────────────────────────

    /// Connect to `host:port`, replacing any current connection.
    pub fn connect(&mut self, host: &str, port: u16) -> bool {
        self.connect_with(&PosixReadiness, host, port)
    }

    /// [`connect`](Self::connect) with an explicit readiness implementation.
    pub fn connect_with<R: Readiness>(&mut self, readiness: &R, host: &str, port: u16) -> bool {
        self.stop();
        match self.open_socket(readiness, host, port) {
            Ok(fd) => {
                if self.chatty(1) {
                    info!("net: connected to {}:{}", host, port);
                }
                self.fd = Some(fd);
                self.reset_peek();
                true
            }
            Err(e) => {
                if self.chatty(1) {
                    warn!("net: {}:{}: {}", host, port, e);
                }
                false
            }
        }
    }

    fn open_socket<R: Readiness>(
        &self,
        readiness: &R,
        host: &str,
        port: u16,
    ) -> Result<OwnedFd, SocketError> {
        let addr = posix::resolve(host, port)?;
        let fd = posix::stream_socket(&addr).map_err(SocketError::Create)?;
        posix::set_nonblocking(fd.as_fd(), true).map_err(SocketError::Create)?;
        let immediate = posix::start_connect(fd.as_fd(), &addr).map_err(SocketError::Connect)?;
        if !immediate {
            await_connect(readiness, fd.as_fd(), self.connect_timeout_ms)?;
        }
        posix::set_nonblocking(fd.as_fd(), false).map_err(SocketError::Create)?;
        Ok(fd)
    }

    // ── State ─────────────────────────────────────────────────

    /// True while a descriptor is held. Says nothing about the peer.
    pub fn connected(&self) -> bool {
        self.fd.is_some()
    }

    /// Peer address of the current connection.
    pub fn remote_ip(&self) -> Option<IpAddr> {
        let fd = self.fd.as_ref()?;
        posix::peer_addr(fd.as_fd()).map(|a| a.ip())
    }

    // ── Reading ───────────────────────────────────────────────

    /// True if a byte can be read now or becomes readable within
    /// `timeout_ms`. Refills the peek buffer with one `recv`; EOF or a read
    /// error stops the client.
    pub fn available(&mut self, timeout_ms: u64) -> bool {
        if self.buffered() > 0 {
            return true;
        }
        let Some(fd) = self.fd.as_ref() else {
            return false;
        };
        match posix::poll(fd.as_fd(), libc::POLLIN, timeout_ms) {
            Ok(0) => return false,
            Ok(_) => {}
            Err(e) => {
                if self.chatty(1) {
                    warn!("net: poll: {}", e);
                }
                return false;
            }
        }
        self.fill_peek()
    }

    fn fill_peek(&mut self) -> bool {
        let Some(fd) = self.fd.as_ref() else {
            return false;
        };
        self.peek.clear();
        self.cursor = 0;
        // Capacity is exactly PEEK_CAPACITY, so this cannot fail.
        let _ = self.peek.resize(PEEK_CAPACITY, 0);
        match posix::recv(fd.as_fd(), &mut self.peek) {
            Ok(0) => {
                if self.chatty(1) {
                    info!("net: peer closed");
                }
                self.stop();
                false
            }
            Ok(n) => {
                self.peek.truncate(n);
                if self.chatty(2) {
                    debug!("net: read {} bytes", n);
                }
                true
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                self.peek.clear();
                false
            }
            Err(e) => {
                if self.chatty(1) {
                    warn!("net: recv: {}", e);
                }
                self.stop();
                false
            }
        }
    }

    /// Next byte, or `None` when nothing arrived within the read timeout
    /// or the connection ended.
    pub fn read(&mut self) -> Option<u8> {
        if !self.available(self.read_timeout_ms) {
            return None;
        }
        let byte = self.peek[self.cursor];
        self.cursor += 1;
        Some(byte)
    }

    /// Copy up to `buf.len()` bytes of what is currently buffered. Never
    /// issues a second `recv` in the same call, so the result may be short.
    pub fn read_array(&mut self, buf: &mut [u8]) -> usize {
        if buf.is_empty() || !self.available(self.read_timeout_ms) {
            return 0;
        }
        let n = buf.len().min(self.buffered());
        buf[..n].copy_from_slice(&self.peek[self.cursor..self.cursor + n]);
        self.cursor += n;
        n
    }

    /// Readiness probe that consumes nothing. A poll error stops the client.
    pub fn pending(&mut self, timeout_ms: u64) -> bool {
        if self.buffered() > 0 {
            return true;
        }
        let Some(fd) = self.fd.as_ref() else {
            return false;
        };
        match posix::poll(fd.as_fd(), libc::POLLIN, timeout_ms) {
            Ok(revents) => revents != 0,
            Err(e) => {
                if self.chatty(1) {
                    warn!("net: poll: {}", e);
                }
                self.stop();
                false
            }
        }
    }

    // ── Writing ───────────────────────────────────────────────

    /// Send all of `buf`. Returns the count actually sent; anything short
    /// of `buf.len()` means the connection was lost and has been stopped.
    pub fn write(&mut self, buf: &[u8]) -> usize {
        let mut sent = 0;
        while sent < buf.len() {
            let Some(fd) = self.fd.as_ref() else {
                break;
            };
            match posix::send(fd.as_fd(), &buf[sent..]) {
                Ok(0) => {
                    if self.chatty(1) {
                        warn!("net: send made no progress after {} bytes", sent);
                    }
                    self.stop();
                    break;
                }
                Ok(n) => sent += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    // Still non-blocking: wait for room rather than spin.
                    let _ = posix::poll(fd.as_fd(), libc::POLLOUT, 100);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    if self.chatty(1) {
                        warn!("net: send: {} after {} bytes", e, sent);
                    }
                    self.stop();
                    break;
                }
            }
        }
        if self.chatty(2) {
            debug!("net: wrote {} of {} bytes", sent, buf.len());
        }
        sent
    }

    pub fn write_byte(&mut self, b: u8) -> usize {
        self.write(&[b])
    }

    pub fn print(&mut self, s: &str) -> usize {
        self.write(s.as_bytes())
    }

    /// `s` followed by CR LF.
    pub fn println(&mut self, s: &str) -> usize {
        let n = self.print(s);
        if n < s.len() {
            return n;
        }
        n + self.write(b"\r\n")
    }

    // ── Teardown ──────────────────────────────────────────────

    /// Shut down and close the connection. Idempotent.
    pub fn stop(&mut self) {
        if let Some(fd) = self.fd.take() {
            posix::shutdown(fd.as_fd());
            if self.chatty(1) {
                info!("net: stopped");
            }
        }
        self.reset_peek();
    }
}

impl Drop for WifiClient {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Transport for WifiClient {
    fn connect(&mut self, host: &str, port: u16) -> bool {
        WifiClient::connect(self, host, port)
    }

    fn connected(&self) -> bool {
        WifiClient::connected(self)
    }

    fn available(&mut self, timeout_ms: u64) -> bool {
        WifiClient::available(self, timeout_ms)
    }

    fn read(&mut self) -> Option<u8> {
        WifiClient::read(self)
    }

    fn read_array(&mut self, buf: &mut [u8]) -> usize {
        WifiClient::read_array(self, buf)
    }

    fn write(&mut self, data: &[u8]) -> usize {
        WifiClient::write(self, data)
    }

    fn stop(&mut self) {
        WifiClient::stop(self);
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
