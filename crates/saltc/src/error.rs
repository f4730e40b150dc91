//! The driver's two exit-code families (spec §6: "1 user error (bad
//! file, no inputs, compile error, linker error); other codes from
//! backend verifier failures").

use std::fmt;

pub enum DriverError {
    /// Exit code 1: bad input, a compile-time diagnostic error, or a
    /// linker failure.
    User(String),
    /// Exit code 2: an internal/backend fault -- LLVM target init,
    /// module verification, or object emission failure (spec §7 kind 3).
    Backend(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::User(msg) | DriverError::Backend(msg) => write!(f, "{msg}"),
        }
    }
}
