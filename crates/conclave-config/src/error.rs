//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("could not read config file {path}: {source}")]
    ReadError {
        /// The path that failed to read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A config file's contents could not be parsed as TOML.
    #[error("could not parse config file {path}: {source}")]
    ParseError {
        /// The path that failed to parse.
        path: String,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// A field failed post-load validation.
    #[error("invalid config field {field}: {message}")]
    ValidationError {
        /// Dotted path of the offending field.
        field: String,
        /// Human-readable explanation.
        message: String,
    },
}

/// Result alias for this crate's fallible operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
