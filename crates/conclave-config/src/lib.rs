//! Unified configuration for the Conclave daemon.
//!
//! A single [`Config`] composes the per-crate config types each consuming
//! crate already defines (`SessionStoreConfig`, `MappingConfig`,
//! `IntegrationConfig`, `ResponseConfig`) so the authoritative shape of
//! each section lives next to the code that uses it.
//!
//! # Precedence
//!
//! 1. **File** (`conclave.toml`, discovered via [`directories::ProjectDirs`]
//!    or passed explicitly) — every field is `#[serde(default)]`, so a file
//!    may set as few or as many sections as it likes.
//! 2. **Environment** (`CONCLAVE_*`) — overrides the small set of fields
//!    that are secrets and should never live in a checked-in file
//!    (webhook HMAC secrets, bot usernames) plus `bind_addr` and
//!    `logging.level` for containerized deployments.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, unsafe_code))]

mod error;
mod loader;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::{Config, LoggingConfig};

impl Config {
    /// Load configuration with file discovery and environment overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a discovered file is malformed or the
    /// resulting configuration fails validation.
    pub fn load(explicit_path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(explicit_path)
    }

    /// Load configuration from a specific file, with no discovery fallback.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or
    /// fails validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Re-run validation against the current field values.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self) -> ConfigResult<()> {
        validate::validate(self)
    }
}
