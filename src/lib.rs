//! HamClock host compatibility layer.
//!
//! Lets code written against the Arduino `WiFiClient` and `EEPROM` APIs run
//! on a POSIX host:
//!
//! - [`adapters::wifi_client::WifiClient`]: TCP client with bounded connect,
//!   peek-buffered reads and complete writes.
//! - [`nvram::NvStore`]: named, cookie-validated settings persisted through
//!   [`adapters::eeprom::FileEeprom`] with single-instance locking.
//!
//! Both are plain objects owned by the caller; nothing here is a global.

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod debug;
pub mod error;
pub mod fatal;
pub mod nvram;
pub mod ports;

pub use adapters::wifi_client::WifiClient;
pub use config::ShimConfig;
pub use debug::{DebugLevels, Subsystem};
pub use error::{Error, SocketError, StoreError};
pub use nvram::{ColorTable, NvName, NvStore, Rgb};
