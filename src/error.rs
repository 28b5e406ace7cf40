//! Unified error types for the compatibility layer.
//!
//! A single `Error` enum that both components convert into, keeping the
//! composition root's error handling uniform. Socket failures are transient
//! and usually absorbed inside [`WifiClient`](crate::adapters::wifi_client::WifiClient);
//! store failures are integrity problems the caller is expected to treat as
//! fatal (see [`crate::fatal`]).

use core::fmt;
use std::io;

use crate::nvram::NvName;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// A socket operation failed.
    Socket(SocketError),
    /// The persistent store failed an integrity or I/O check.
    Store(StoreError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(e) => write!(f, "socket: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Socket(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Config(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Socket errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum SocketError {
    /// Host name did not resolve to any stream address.
    Resolve(String),
    /// `socket(2)` or an `fcntl`/`setsockopt` on the new socket failed.
    Create(io::Error),
    /// `connect(2)` failed immediately or via the pending `SO_ERROR`.
    Connect(io::Error),
    /// The readiness wait expired before the connection completed.
    Timeout { ms: u64 },
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(host) => write!(f, "cannot resolve {host}"),
            Self::Create(e) => write!(f, "socket setup failed: {e}"),
            Self::Connect(e) => write!(f, "connect failed: {e}"),
            Self::Timeout { ms } => write!(f, "connect timed out after {ms} ms"),
        }
    }
}

impl std::error::Error for SocketError {}

impl From<SocketError> for Error {
    fn from(e: SocketError) -> Self {
        Self::Socket(e)
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Integrity and availability failures of the keyed store.
///
/// Every variant here is fatal for an unattended appliance; the one
/// recoverable outcome ("never written") is not an error at all and is
/// reported as `Ok(None)` by the read paths.
#[derive(Debug)]
pub enum StoreError {
    /// Base + slots + cookies + color tables do not fit the store.
    CapacityExceeded { required: usize, capacity: usize },
    /// Another process holds the exclusive lock on the store file.
    Locked { path: String },
    /// The store file could not be created, read or rewritten.
    Io(io::Error),
    /// Caller's expected length disagrees with the slot table.
    LengthMismatch {
        name: NvName,
        expected: usize,
        declared: usize,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { required, capacity } => write!(
                f,
                "NV layout needs {required} bytes but the store holds only {capacity}"
            ),
            Self::Locked { path } => write!(
                f,
                "{path} is in use by another HamClock; \
                 give each instance its own config directory with -d"
            ),
            Self::Io(e) => write!(f, "store I/O error: {e}"),
            Self::LengthMismatch {
                name,
                expected,
                declared,
            } => write!(
                f,
                "{name:?}: caller expects {expected} bytes, table declares {declared}"
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
