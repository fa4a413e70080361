//! Runner version information.
//!
//! The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time. Prefer this constant over repeating
//! `env!("CARGO_PKG_VERSION")`.

/// The runner version string (for example, `0.1.0`).
pub const ATTRUN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Program name reported in the banner.
pub const PROGRAM_NAME: &str = "attrun";
