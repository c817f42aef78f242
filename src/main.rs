//! Catalog-Sync main entry point
//!
//! This is the command-line interface for the catalog to CRM sync engine.

use anyhow::Context;
use catalog_sync::catalog::{CatalogSource, HttpCatalog};
use catalog_sync::config::{load_config_with_hash, Config, CrmConfig};
use catalog_sync::crm::{CrmApi, HubSpotCrm, InMemoryCrm};
use catalog_sync::remote::build_http_client;
use catalog_sync::sync::print_summary;
use catalog_sync::{EntityType, SyncEngine};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Catalog-Sync: moves catalog records into a CRM
///
/// Reads characters from the catalog, upserts them as contacts, upserts
/// their origin locations as companies and links the two. Re-running is
/// safe: nothing is duplicated.
#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(version = "1.0.0")]
#[command(about = "Catalog to CRM synchronization", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run the full sync against an in-memory CRM instead of the real one
    #[arg(long, conflicts_with = "apply_change")]
    dry_run: bool,

    /// Apply a single changed record (JSON file) instead of a full sync
    #[arg(long, value_name = "FILE", requires = "entity")]
    apply_change: Option<PathBuf>,

    /// Kind of record in the change file
    #[arg(long, value_enum, requires = "apply_change")]
    entity: Option<EntityArg>,

    /// CRM account the change is applied to
    #[arg(long, value_enum, default_value = "primary")]
    target: Target,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EntityArg {
    Contact,
    Company,
}

impl From<EntityArg> for EntityType {
    fn from(arg: EntityArg) -> Self {
        match arg {
            EntityArg::Contact => EntityType::Contact,
            EntityArg::Company => EntityType::Company,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    Primary,
    Mirror,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match (cli.apply_change, cli.entity) {
        (Some(path), Some(entity)) => {
            handle_apply_change(&config, &path, entity.into(), cli.target).await?
        }
        _ => handle_full_sync(&config, cli.dry_run).await?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_sync=info,warn"),
            1 => EnvFilter::new("catalog_sync=debug,info"),
            2 => EnvFilter::new("catalog_sync=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn hubspot_client(
    client: reqwest::Client,
    crm: &CrmConfig,
) -> Result<Arc<dyn CrmApi>, Box<dyn std::error::Error>> {
    let token = crm.access_token()?;
    Ok(Arc::new(HubSpotCrm::new(client, &crm.base_url, token)))
}

/// Handles the default mode: one full sync run
async fn handle_full_sync(config: &Config, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_http_client()?;
    let catalog: Arc<dyn CatalogSource> =
        Arc::new(HttpCatalog::new(client.clone(), &config.catalog.base_url));

    let crm: Arc<dyn CrmApi> = if dry_run {
        println!("=== Catalog-Sync Dry Run (in-memory CRM) ===\n");
        Arc::new(InMemoryCrm::new())
    } else {
        hubspot_client(client, &config.crm)?
    };

    let mut engine = SyncEngine::from_config(config, catalog, crm);
    let result = engine.run_full_sync().await;
    match result {
        Ok(summary) => {
            print_summary(&summary);
            if !summary.is_clean() {
                tracing::warn!("Sync finished with per-record failures; re-run to retry them");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Sync failed in phase {}: {}", engine.phase(), e);
            Err(e.into())
        }
    }
}

/// Handles --apply-change: upserts one record into the chosen account
async fn handle_apply_change(
    config: &Config,
    path: &Path,
    entity: EntityType,
    target: Target,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = read_payload(path)?;

    let crm_config = match target {
        Target::Primary => &config.crm,
        Target::Mirror => config
            .mirror
            .as_ref()
            .context("--target mirror requires a [mirror] section in the config")?,
    };

    let client = build_http_client()?;
    let catalog: Arc<dyn CatalogSource> =
        Arc::new(HttpCatalog::new(client.clone(), &config.catalog.base_url));
    let crm = hubspot_client(client, crm_config)?;

    let engine = SyncEngine::from_config(config, catalog, crm);
    let outcome = engine.apply_one_record_change(entity, payload).await?;
    println!("{} {} ({:?} account)", entity, outcome, target);

    Ok(())
}

fn read_payload(path: &Path) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read change file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Change file {} is not valid JSON", path.display()))
}
