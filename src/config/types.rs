use crate::catalog::Selection;
use crate::sync::SearchFailurePolicy;
use crate::ConfigError;
use serde::Deserialize;

/// Main configuration structure for Catalog-Sync
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub crm: CrmConfig,
    /// Second CRM instance kept aligned through single-record changes
    #[serde(default)]
    pub mirror: Option<CrmConfig>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// External catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog API (e.g., "https://rickandmortyapi.com/api")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Which records to migrate
    #[serde(default)]
    pub selection: SelectionMode,

    /// Explicit ids, used when `selection = "ids"`
    #[serde(default)]
    pub ids: Vec<u64>,
}

impl CatalogConfig {
    /// Builds the record selection predicate described by this section
    pub fn selection(&self) -> Selection {
        match self.selection {
            SelectionMode::All => Selection::All,
            SelectionMode::IdOneAndPrimes => Selection::IdOneAndPrimes,
            SelectionMode::Ids => Selection::Ids(self.ids.clone()),
        }
    }
}

/// Record selection mode for a full sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    All,
    #[default]
    IdOneAndPrimes,
    Ids,
}

/// Destination CRM account configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrmConfig {
    /// Base URL of the CRM API (e.g., "https://api.hubapi.com")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Name of the environment variable holding the private app token
    #[serde(rename = "access-token-env")]
    pub access_token_env: String,
}

impl CrmConfig {
    /// Reads the access token from the configured environment variable
    pub fn access_token(&self) -> Result<String, ConfigError> {
        std::env::var(&self.access_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential(self.access_token_env.clone()))
    }
}

/// Retry and backoff configuration for remote calls
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per remote operation, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff (milliseconds)
    #[serde(rename = "initial-delay-ms", default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound on any single backoff delay (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

/// Defaults applied when mapping catalog records to CRM properties
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    /// Domain used for synthetic contact emails
    #[serde(rename = "email-domain", default = "default_email_domain")]
    pub email_domain: String,

    /// Lifecycle stage assigned to every migrated contact
    #[serde(rename = "lifecycle-stage", default = "default_lifecycle_stage")]
    pub lifecycle_stage: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            email_domain: default_email_domain(),
            lifecycle_stage: default_lifecycle_stage(),
        }
    }
}

fn default_email_domain() -> String {
    "rickandmorty.com".to_string()
}

fn default_lifecycle_stage() -> String {
    "lead".to_string()
}

/// Sync engine behavior
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
    /// What to do when the existence-check search itself fails
    #[serde(rename = "search-failure", default)]
    pub search_failure: SearchFailurePolicy,
}
