//! Logging setup for the dockshell binaries and tests.
//!
//! - **Logging**: human-readable and JSON-formatted output via `tracing-subscriber`
//! - **Tracing**: operation spans carrying a trace ID, so that every log line
//!   emitted while driving one container can be correlated

pub mod logging;
pub mod tracing_setup;
