//! Shared library for the MangaDex client workspace.
//!
//! This crate provides the application plumbing used by the binaries:
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod logging;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
