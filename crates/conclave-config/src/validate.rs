//! Post-load configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-loaded configuration, rejecting nonsensical values
/// before the daemon starts.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_session(config)?;
    validate_mapping(config)?;
    validate_response(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_session(config: &Config) -> ConfigResult<()> {
    let s = &config.session;

    if s.max_users_per_session == 0 {
        return Err(ConfigError::ValidationError {
            field: "session.max_users_per_session".to_owned(),
            message: "must be greater than 0".to_owned(),
        });
    }
    if s.max_clients_per_user == 0 {
        return Err(ConfigError::ValidationError {
            field: "session.max_clients_per_user".to_owned(),
            message: "must be greater than 0".to_owned(),
        });
    }
    if s.max_queue_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "session.max_queue_size".to_owned(),
            message: "must be greater than 0".to_owned(),
        });
    }

    Ok(())
}

fn validate_mapping(config: &Config) -> ConfigResult<()> {
    if config.mapping.max_mappings == 0 {
        return Err(ConfigError::ValidationError {
            field: "mapping.max_mappings".to_owned(),
            message: "must be greater than 0".to_owned(),
        });
    }
    if config.mapping.idle_timeout.is_zero() {
        return Err(ConfigError::ValidationError {
            field: "mapping.idle_timeout".to_owned(),
            message: "must be greater than 0".to_owned(),
        });
    }

    Ok(())
}

fn validate_response(config: &Config) -> ConfigResult<()> {
    if config.response.max_length == 0 {
        return Err(ConfigError::ValidationError {
            field: "response.max_length".to_owned(),
            message: "must be greater than 0".to_owned(),
        });
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn zero_max_users_is_rejected() {
        let mut config = Config::default();
        config.session.max_users_per_session = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_max_mappings_is_rejected() {
        let mut config = Config::default();
        config.mapping.max_mappings = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_owned();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn invalid_log_format_is_rejected() {
        let mut config = Config::default();
        config.logging.format = "yaml".to_owned();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_response_max_length_is_rejected() {
        let mut config = Config::default();
        config.response.max_length = 0;
        assert!(validate(&config).is_err());
    }
}
