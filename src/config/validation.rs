use crate::config::types::{CatalogConfig, Config, CrmConfig, MappingConfig, RetryConfig};
use crate::config::SelectionMode;
use crate::mapper::is_valid_email;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_crm_config("crm", &config.crm)?;
    if let Some(mirror) = &config.mirror {
        validate_crm_config("mirror", mirror)?;
    }
    validate_retry_config(&config.retry)?;
    validate_mapping_config(&config.mapping)?;
    Ok(())
}

/// Validates catalog configuration
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    validate_base_url("catalog", &config.base_url)?;

    if config.selection == SelectionMode::Ids && config.ids.is_empty() {
        return Err(ConfigError::Validation(
            "catalog selection 'ids' requires at least one id".to_string(),
        ));
    }

    Ok(())
}

/// Validates a CRM account section
fn validate_crm_config(section: &str, config: &CrmConfig) -> Result<(), ConfigError> {
    validate_base_url(section, &config.base_url)?;

    let env_name = config.access_token_env.trim();
    if env_name.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{}.access-token-env cannot be empty",
            section
        )));
    }

    if !env_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "{}.access-token-env must be a valid environment variable name, got '{}'",
            section, config.access_token_env
        )));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.initial_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "initial-delay-ms ({}) cannot exceed max-delay-ms ({})",
            config.initial_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates mapping defaults
fn validate_mapping_config(config: &MappingConfig) -> Result<(), ConfigError> {
    // The domain must produce valid addresses for the id-only fallback
    let probe = format!("1@{}", config.email_domain);
    if !is_valid_email(&probe) {
        return Err(ConfigError::Validation(format!(
            "email-domain '{}' does not produce valid email addresses",
            config.email_domain
        )));
    }

    if config.lifecycle_stage.trim().is_empty() {
        return Err(ConfigError::Validation(
            "lifecycle-stage cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that a base URL parses and uses an HTTP scheme
fn validate_base_url(section: &str, base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid {}.base-url '{}': {}", section, base_url, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "{}.base-url '{}' must use http or https",
            section, base_url
        )));
    }

    Ok(())
}
