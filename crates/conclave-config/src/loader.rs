//! Config file discovery and two-tier loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Deserialize the config file (if one exists), falling back to
//!    per-field defaults for anything the file omits.
//! 2. Apply `CONCLAVE_*` environment variable overrides for the handful of
//!    secrets that should never live in a checked-in file.
//! 3. Validate.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Load configuration from an explicit path, or by discovering
/// `conclave.toml` in the platform config directory.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file exists but is malformed, or if the
/// resulting configuration fails validation.
pub fn load(explicit_path: Option<&Path>) -> ConfigResult<Config> {
    let path = explicit_path.map(Path::to_path_buf).or_else(discover_path);

    let mut config = match path {
        Some(path) => match try_load_file(&path)? {
            Some(config) => {
                info!(path = %path.display(), "loaded config file");
                config
            }
            None => {
                debug!(path = %path.display(), "no config file found, using defaults");
                Config::default()
            }
        },
        None => Config::default(),
    };

    let overridden = apply_env_overrides(&mut config);
    if overridden > 0 {
        debug!(count = overridden, "applied CONCLAVE_* environment overrides");
    }

    validate::validate(&config)?;
    Ok(config)
}

/// Load configuration from a specific file, with no discovery fallback.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let config = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;
    validate::validate(&config)?;
    Ok(config)
}

fn discover_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "conclave")
        .map(|dirs| dirs.config_dir().join("conclave.toml"))
}

fn try_load_file(path: &Path) -> ConfigResult<Option<Config>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: err,
            })
        }
    };

    let config: Config = toml::from_str(&content).map_err(|err| ConfigError::ParseError {
        path: path.display().to_string(),
        source: err,
    })?;
    Ok(Some(config))
}

/// Apply `CONCLAVE_*` overrides for fields that should be sourced from the
/// environment rather than a checked-in file. Returns how many were
/// applied.
fn apply_env_overrides(config: &mut Config) -> usize {
    let mut count = 0;

    if let Ok(value) = std::env::var("CONCLAVE_BIND_ADDR") {
        config.bind_addr = value;
        count += 1;
    }
    if let Ok(value) = std::env::var("CONCLAVE_SOURCE_CONTROL_WEBHOOK_SECRET") {
        config.source_control.webhook_secret = value;
        count += 1;
    }
    if let Ok(value) = std::env::var("CONCLAVE_SOURCE_CONTROL_BOT_USERNAME") {
        config.source_control.bot_username = Some(value);
        count += 1;
    }
    if let Ok(value) = std::env::var("CONCLAVE_CHAT_WEBHOOK_SECRET") {
        config.chat.webhook_secret = value;
        count += 1;
    }
    if let Ok(value) = std::env::var("CONCLAVE_CHAT_BOT_USERNAME") {
        config.chat.bot_username = Some(value);
        count += 1;
    }
    if let Ok(value) = std::env::var("CONCLAVE_LOG_LEVEL") {
        config.logging.level = value;
        count += 1;
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_without_a_file_returns_defaults() {
        let config = load(Some(Path::new("/nonexistent/conclave.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_file_rejects_missing_path() {
        let err = load_file(Path::new("/nonexistent/conclave.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn load_file_parses_partial_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conclave.toml");
        std::fs::write(&path, "bind_addr = \"0.0.0.0:9000\"\n").unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.session, conclave_session::SessionStoreConfig::default());
    }

    #[test]
    fn env_override_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conclave.toml");
        std::fs::write(&path, "bind_addr = \"0.0.0.0:9000\"\n").unwrap();

        // SAFETY: test-only, no other thread in this process reads this var concurrently.
        unsafe {
            std::env::set_var("CONCLAVE_BIND_ADDR", "127.0.0.1:1234");
        }
        let config = load(Some(&path)).unwrap();
        unsafe {
            std::env::remove_var("CONCLAVE_BIND_ADDR");
        }

        assert_eq!(config.bind_addr, "127.0.0.1:1234");
    }
}
