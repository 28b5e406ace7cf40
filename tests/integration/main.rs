//! Integration test driver for `tests/integration/` submodules.
//!
//! Store tests run against real files in a temporary config directory;
//! client tests talk to loopback listeners and socket pairs. Nothing here
//! needs network access beyond 127.0.0.1.

mod client_tests;
mod store_tests;
mod support;
