//! Catalog-Sync: a catalog to CRM synchronization engine
//!
//! This crate moves records from a read-only external catalog into a CRM,
//! resolving each record to at most one destination record per natural key,
//! linking contacts to companies, and riding out a rate-limited remote API.

pub mod catalog;
pub mod config;
pub mod crm;
pub mod mapper;
pub mod remote;
pub mod sync;

use thiserror::Error;

/// Main error type for Catalog-Sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Catalog unavailable: {source}")]
    CatalogUnavailable { source: remote::InvokeError },

    #[error("Catalog lookup failed for {link}: {source}")]
    CatalogLookup {
        link: String,
        source: remote::InvokeError,
    },

    #[error("Upsert failed for {entity} {key}: {source}")]
    UpsertFailed {
        entity: crm::EntityType,
        key: crm::NaturalKey,
        source: remote::InvokeError,
    },

    #[error("Association failed between contact {contact_id} and company {company_id}: {source}")]
    AssociationFailed {
        contact_id: String,
        company_id: String,
        source: remote::InvokeError,
    },

    #[error("Invalid record payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: sync::SyncPhase,
        to: sync::SyncPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),
}

/// Result type alias for Catalog-Sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crm::{DestinationIdentity, EntityType, NaturalKey};
pub use sync::{SyncEngine, SyncPhase, SyncSummary, UpsertOutcome};
