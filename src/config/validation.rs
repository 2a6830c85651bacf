use crate::config::types::{ApiConfig, Config, OutputConfig, WalkerConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// A missing trailing slash on the base URL is repaired in place so that
/// relative request paths join beneath it instead of replacing its last
/// segment.
pub fn validate(config: &mut Config) -> Result<(), ConfigError> {
    validate_api_config(&mut config.api)?;
    validate_walker_config(&config.walker)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates API configuration
fn validate_api_config(config: &mut ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.base_url.ends_with('/') {
        config.base_url.push('/');
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates walker configuration
fn validate_walker_config(config: &WalkerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_brands < 1 || config.max_concurrent_brands > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-brands must be between 1 and 64, got {}",
            config.max_concurrent_brands
        )));
    }

    if let Some(vehicle_type) = &config.vehicle_type {
        if vehicle_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "vehicle-type cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
