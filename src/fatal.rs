//! Process termination for unrecoverable integrity failures.
//!
//! Library code returns [`StoreError`](crate::error::StoreError)s; only the
//! composition root decides to die, through the helpers here.

use core::fmt::Display;

use log::error;

/// Log `msg` and exit with status 1.
pub fn fatal_error(msg: impl Display) -> ! {
    error!("fatal: {msg}");
    log::logger().flush();
    eprintln!("HamClock: {msg}");
    std::process::exit(1)
}

/// `Result` extension that turns an error into [`fatal_error`].
pub trait OrFatal<T> {
    fn or_fatal(self, context: &str) -> T;
}

impl<T, E: Display> OrFatal<T> for Result<T, E> {
    fn or_fatal(self, context: &str) -> T {
        match self {
            Ok(v) => v,
            Err(e) => fatal_error(format_args!("{context}: {e}")),
        }
    }
}
