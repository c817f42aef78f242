//! Upsert by natural key
//!
//! Search for the key (exact match, one result). Found: update it. Not
//! found: create. The first search hit is canonical; existing duplicates are
//! left alone.

use crate::crm::{CrmApi, DestinationIdentity, EntityType, NaturalKey};
use crate::mapper::MappedProperties;
use crate::remote::ResilientClient;
use crate::SyncError;
use serde::Deserialize;
use std::fmt;

/// What to do when the existence-check search itself fails
///
/// `CreateAnyway` keeps the record moving but can create a duplicate if the
/// search failed for a reason other than an unavailable search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchFailurePolicy {
    #[default]
    CreateAnyway,
    FailRecord,
}

/// Whether an upsert created a record or updated an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of resolving one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub identity: DestinationIdentity,
    pub outcome: UpsertOutcome,
}

impl Resolution {
    pub fn created(&self) -> bool {
        self.outcome == UpsertOutcome::Created
    }
}

/// Finds or creates destination records by natural key
pub struct Resolver<'a> {
    crm: &'a dyn CrmApi,
    remote: &'a ResilientClient,
    search_failure: SearchFailurePolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(
        crm: &'a dyn CrmApi,
        remote: &'a ResilientClient,
        search_failure: SearchFailurePolicy,
    ) -> Self {
        Self {
            crm,
            remote,
            search_failure,
        }
    }

    /// Upserts `mapped` as an `entity` record identified by `key`
    ///
    /// # Returns
    ///
    /// * `Ok(Resolution)` - The record's identity and whether it was created
    /// * `Err(SyncError::UpsertFailed)` - The create or update failed, or the
    ///   search failed under `SearchFailurePolicy::FailRecord`
    pub async fn resolve(
        &self,
        mapped: &MappedProperties,
        key: &NaturalKey,
        entity: EntityType,
    ) -> Result<Resolution, SyncError> {
        let crm = self.crm;
        let upsert_failed = |source| SyncError::UpsertFailed {
            entity,
            key: key.clone(),
            source,
        };

        let search = self
            .remote
            .invoke(&format!("search {} {}", entity, key), move || {
                crm.search(entity, &key.property, &key.value, 1)
            })
            .await;

        let existing = match search {
            Ok(found) => found.into_iter().next(),
            Err(source) => match self.search_failure {
                SearchFailurePolicy::CreateAnyway => {
                    tracing::warn!(
                        "Search for {} {} failed ({}), creating without existence check",
                        entity,
                        key,
                        source
                    );
                    None
                }
                SearchFailurePolicy::FailRecord => return Err(upsert_failed(source)),
            },
        };

        let (id, outcome) = match existing {
            Some(found) => {
                let found_id = found.id;
                let id = self
                    .remote
                    .invoke(&format!("update {} {}", entity, found_id), || {
                        crm.update(entity, &found_id, mapped)
                    })
                    .await
                    .map_err(upsert_failed)?;
                (id, UpsertOutcome::Updated)
            }
            None => {
                let id = self
                    .remote
                    .invoke(&format!("create {} {}", entity, key), move || {
                        crm.create(entity, mapped)
                    })
                    .await
                    .map_err(upsert_failed)?;
                (id, UpsertOutcome::Created)
            }
        };

        tracing::debug!("{} {} {} as {}", outcome, entity, key, id);

        Ok(Resolution {
            identity: DestinationIdentity {
                id,
                natural_key: key.clone(),
            },
            outcome,
        })
    }
}
