//! Configuration and logging setup shared by the library and the binary.

/// TOML configuration loading and validation.
pub mod config;
/// Tracing subscriber initialization.
pub mod logging;
