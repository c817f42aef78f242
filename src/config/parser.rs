use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs against different settings can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Selection;
    use crate::config::SelectionMode;
    use crate::sync::SearchFailurePolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config_applies_defaults() {
        let config_content = r#"
[catalog]
base-url = "https://rickandmortyapi.com/api"

[crm]
base-url = "https://api.hubapi.com"
access-token-env = "HUBSPOT_PRIMARY_TOKEN"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.catalog.selection, SelectionMode::IdOneAndPrimes);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(config.mapping.lifecycle_stage, "lead");
        assert_eq!(config.sync.search_failure, SearchFailurePolicy::CreateAnyway);
        assert!(config.mirror.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[catalog]
base-url = "https://rickandmortyapi.com/api"
selection = "ids"
ids = [1, 2, 42]

[crm]
base-url = "https://api.hubapi.com"
access-token-env = "HUBSPOT_PRIMARY_TOKEN"

[mirror]
base-url = "https://api.hubapi.com"
access-token-env = "HUBSPOT_MIRROR_TOKEN"

[retry]
max-attempts = 5
initial-delay-ms = 250
max-delay-ms = 10000

[mapping]
email-domain = "citadel.org"
lifecycle-stage = "subscriber"

[sync]
search-failure = "fail-record"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.catalog.selection(), Selection::Ids(vec![1, 2, 42]));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.mapping.email_domain, "citadel.org");
        assert_eq!(config.sync.search_failure, SearchFailurePolicy::FailRecord);
        assert_eq!(
            config.mirror.unwrap().access_token_env,
            "HUBSPOT_MIRROR_TOKEN"
        );
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/sync.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[catalog]
base-url = "https://rickandmortyapi.com/api"

[crm]
base-url = "https://api.hubapi.com"
access-token-env = "HUBSPOT_PRIMARY_TOKEN"

[retry]
max-attempts = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
