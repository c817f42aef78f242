//! Sync orchestrator - full sync sequencing
//!
//! This module drives a full sync run:
//! - Reading and selecting catalog records
//! - Resolving each distinct company once
//! - Resolving one contact per record
//! - Associating contacts with their companies
//! - Deciding which failures are fatal (only the initial catalog fetch)
//!
//! Records are handled strictly one after another. The CRM rate limit is
//! shared across all calls, so there is nothing to gain from parallelism.

use crate::catalog::{CatalogReader, CatalogSource, ExternalRecord, LocationRecord, Selection};
use crate::config::{Config, MappingConfig};
use crate::crm::{CrmApi, DestinationIdentity, EntityType, NaturalKey};
use crate::mapper::{
    to_company_properties, to_contact_properties, MappedProperties, COMPANY_KEY_PROPERTY,
    CONTACT_KEY_PROPERTY,
};
use crate::remote::{ResilientClient, RetryPolicy};
use crate::sync::{
    AssociationBuilder, IdentityCache, Resolver, SearchFailurePolicy, SkipReason, SyncPhase,
    SyncSummary, UpsertOutcome,
};
use crate::SyncError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// A contact resolved in phase 2, with the record it came from
struct ResolvedContact<'r> {
    record: &'r ExternalRecord,
    identity: DestinationIdentity,
}

/// Moves catalog records into one CRM account
pub struct SyncEngine {
    catalog: Arc<dyn CatalogSource>,
    crm: Arc<dyn CrmApi>,
    remote: ResilientClient,
    selection: Selection,
    mapping: MappingConfig,
    search_failure: SearchFailurePolicy,
    phase: SyncPhase,
}

impl SyncEngine {
    /// Creates an engine with default selection, mapping and policies
    ///
    /// # Arguments
    ///
    /// * `catalog` - Source catalog handle
    /// * `crm` - Destination CRM handle
    /// * `remote` - Retry wrapper used for every outbound call
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        crm: Arc<dyn CrmApi>,
        remote: ResilientClient,
    ) -> Self {
        Self {
            catalog,
            crm,
            remote,
            selection: Selection::default(),
            mapping: MappingConfig::default(),
            search_failure: SearchFailurePolicy::default(),
            phase: SyncPhase::Idle,
        }
    }

    /// Creates an engine configured from a loaded config file
    pub fn from_config(
        config: &Config,
        catalog: Arc<dyn CatalogSource>,
        crm: Arc<dyn CrmApi>,
    ) -> Self {
        Self::new(
            catalog,
            crm,
            ResilientClient::new(RetryPolicy::from(&config.retry)),
        )
        .with_selection(config.catalog.selection())
        .with_mapping(config.mapping.clone())
        .with_search_failure(config.sync.search_failure)
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_mapping(mut self, mapping: MappingConfig) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_search_failure(mut self, policy: SearchFailurePolicy) -> Self {
        self.search_failure = policy;
        self
    }

    /// Phase of the current or most recent run
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    fn transition(&mut self, next: SyncPhase) -> Result<(), SyncError> {
        if !self.phase.can_transition_to(next) {
            return Err(SyncError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Sync phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    fn reader(&self) -> CatalogReader<'_> {
        CatalogReader::new(self.catalog.as_ref(), &self.remote)
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.crm.as_ref(), &self.remote, self.search_failure)
    }

    /// Runs a complete sync: companies, then contacts, then associations
    ///
    /// Safe to re-run: upserts and associations are idempotent, so repeating
    /// the whole run is also the recovery path after an interruption.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncSummary)` - The run completed; per-record failures are counted
    /// * `Err(SyncError::CatalogUnavailable)` - The records to migrate could not be fetched
    pub async fn run_full_sync(&mut self) -> Result<SyncSummary, SyncError> {
        let start_time = Instant::now();
        self.phase = SyncPhase::Idle;

        let mut summary = SyncSummary::default();
        let mut cache = IdentityCache::new();

        self.transition(SyncPhase::FetchingCompanies)?;
        let fetched = self.reader().read_selected(&self.selection).await;
        let records = match fetched {
            Ok(records) => records,
            Err(source) => {
                tracing::error!("Could not fetch records to migrate: {}", source);
                self.transition(SyncPhase::Failed)?;
                return Err(SyncError::CatalogUnavailable { source });
            }
        };
        summary.records_selected = records.len();

        self.resolve_companies(&records, &mut cache, &mut summary)
            .await;
        tracing::info!(
            "Companies: {} processed, {} failed",
            summary.companies_processed,
            summary.companies_failed
        );

        self.transition(SyncPhase::FetchingContacts)?;
        let contacts = self.resolve_contacts(&records, &mut summary).await;
        tracing::info!(
            "Contacts: {} created, {} updated, {} failed",
            summary.contacts_created,
            summary.contacts_updated,
            summary.contacts_failed
        );

        self.transition(SyncPhase::Associating)?;
        self.associate_contacts(&contacts, &cache, &mut summary)
            .await;
        tracing::info!(
            "Associations: {} created, {} skipped, {} failed",
            summary.associations_created,
            summary.associations_skipped,
            summary.associations_failed
        );

        self.transition(SyncPhase::Done)?;
        tracing::info!(
            "Sync completed: {} records in {:?}",
            summary.records_selected,
            start_time.elapsed()
        );

        Ok(summary)
    }

    /// Phase 1: resolve each distinct origin location once and cache it
    async fn resolve_companies(
        &self,
        records: &[ExternalRecord],
        cache: &mut IdentityCache,
        summary: &mut SyncSummary,
    ) {
        let reader = self.reader();
        let resolver = self.resolver();
        let mut seen = HashSet::new();

        for link in records.iter().filter_map(ExternalRecord::origin_link) {
            if !seen.insert(link) {
                continue;
            }

            let location = match reader.get_by_relation_link(link).await {
                Ok(location) => location,
                Err(source) => {
                    let e = SyncError::CatalogLookup {
                        link: link.to_string(),
                        source,
                    };
                    tracing::warn!("{}", e);
                    summary.companies_failed += 1;
                    continue;
                }
            };

            match self.upsert_company(&resolver, &location).await {
                Ok(identity) => {
                    summary.companies_processed += 1;
                    cache.insert(link, identity);
                }
                Err(e) => {
                    tracing::error!("Failed to resolve company for {}: {}", link, e);
                    summary.companies_failed += 1;
                }
            }
        }
    }

    /// Phase 2: resolve one contact per selected record
    async fn resolve_contacts<'r>(
        &self,
        records: &'r [ExternalRecord],
        summary: &mut SyncSummary,
    ) -> Vec<ResolvedContact<'r>> {
        let resolver = self.resolver();
        let mut resolved = Vec::with_capacity(records.len());

        for record in records {
            let mapped = to_contact_properties(record, &self.mapping);
            let result = match natural_key(EntityType::Contact, &mapped) {
                Ok(key) => resolver.resolve(&mapped, &key, EntityType::Contact).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(resolution) => {
                    tracing::info!(
                        "Contact {} ({}) {}",
                        record.id,
                        record.name,
                        resolution.outcome
                    );
                    summary.record_contact(resolution.outcome);
                    resolved.push(ResolvedContact {
                        record,
                        identity: resolution.identity,
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to sync contact {} ({}): {}", record.id, record.name, e);
                    summary.contacts_failed += 1;
                }
            }
        }

        resolved
    }

    /// Phase 3: link each resolved contact to its cached company
    async fn associate_contacts(
        &self,
        contacts: &[ResolvedContact<'_>],
        cache: &IdentityCache,
        summary: &mut SyncSummary,
    ) {
        let builder = AssociationBuilder::new(self.crm.as_ref(), &self.remote);

        for contact in contacts {
            let outcome = match contact.record.origin_link() {
                None => Ok(builder.skip(Some(&contact.identity), SkipReason::LocationUnavailable)),
                Some(link) => {
                    builder
                        .associate(Some(&contact.identity), cache.get(link))
                        .await
                }
            };

            match outcome {
                Ok(outcome) => summary.record_association(outcome),
                Err(e) => {
                    tracing::error!("{}", e);
                    summary.associations_failed += 1;
                }
            }
        }
    }

    async fn upsert_company(
        &self,
        resolver: &Resolver<'_>,
        location: &LocationRecord,
    ) -> Result<DestinationIdentity, SyncError> {
        let mapped = to_company_properties(location);
        let key = natural_key(EntityType::Company, &mapped)?;
        let resolution = resolver.resolve(&mapped, &key, EntityType::Company).await?;
        Ok(resolution.identity)
    }

    /// Applies a single changed catalog record without a catalog scan
    ///
    /// Used for webhook-style updates and to keep a mirror CRM aligned.
    ///
    /// # Arguments
    ///
    /// * `entity` - `Contact` for a character payload, `Company` for a location payload
    /// * `payload` - The catalog record as JSON
    ///
    /// # Returns
    ///
    /// * `Ok(UpsertOutcome)` - Whether the destination record was created or updated
    /// * `Err(SyncError::InvalidPayload)` - The payload is not a record of that kind
    /// * `Err(SyncError::UpsertFailed)` - The CRM upsert failed
    pub async fn apply_one_record_change(
        &self,
        entity: EntityType,
        payload: serde_json::Value,
    ) -> Result<UpsertOutcome, SyncError> {
        let resolver = self.resolver();

        let invalid = |e: serde_json::Error| SyncError::InvalidPayload(e.to_string());
        let mapped = match entity {
            EntityType::Contact => {
                let record: ExternalRecord = serde_json::from_value(payload).map_err(invalid)?;
                to_contact_properties(&record, &self.mapping)
            }
            EntityType::Company => {
                let location: LocationRecord = serde_json::from_value(payload).map_err(invalid)?;
                to_company_properties(&location)
            }
        };
        let key = natural_key(entity, &mapped)?;

        let resolution = resolver.resolve(&mapped, &key, entity).await?;
        tracing::info!(
            "Applied {} change for {}: {}",
            entity,
            key,
            resolution.outcome
        );
        Ok(resolution.outcome)
    }
}

/// Reads the natural key out of a mapped record; blank keys are rejected
fn natural_key(entity: EntityType, mapped: &MappedProperties) -> Result<NaturalKey, SyncError> {
    let property = match entity {
        EntityType::Contact => CONTACT_KEY_PROPERTY,
        EntityType::Company => COMPANY_KEY_PROPERTY,
    };
    NaturalKey::from_properties(mapped, property).ok_or_else(|| {
        SyncError::InvalidPayload(format!("{} record has no {}", entity, property))
    })
}
