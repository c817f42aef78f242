//! Configuration module for Catalog-Sync
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_sync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sync.toml")).unwrap();
//! println!("Catalog: {}", config.catalog.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CatalogConfig, Config, CrmConfig, MappingConfig, RetryConfig, SelectionMode, SyncConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
