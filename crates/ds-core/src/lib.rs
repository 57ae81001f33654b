//! Shared configuration for the dockshell crates.
//!
//! [`config::Config`] holds the container runtime executable, the container
//! name prefix and the shell settings. It is passed explicitly to the
//! session bootstrap and the container runtime.

pub mod config;
