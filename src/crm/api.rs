use crate::crm::{AssociationDescriptor, CrmObject, EntityType};
use crate::mapper::MappedProperties;
use crate::remote::RemoteError;
use async_trait::async_trait;

/// Operations the sync needs from a destination CRM
///
/// Each method is a single remote attempt. Callers route them through
/// [`crate::remote::ResilientClient`] for retries.
#[async_trait]
pub trait CrmApi: Send + Sync {
    /// Exact-match search on one property, returning at most `limit` records
    async fn search(
        &self,
        entity: EntityType,
        property: &str,
        value: &str,
        limit: usize,
    ) -> Result<Vec<CrmObject>, RemoteError>;

    /// Creates a record and returns its id
    async fn create(
        &self,
        entity: EntityType,
        properties: &MappedProperties,
    ) -> Result<String, RemoteError>;

    /// Updates an existing record and returns its id
    async fn update(
        &self,
        entity: EntityType,
        id: &str,
        properties: &MappedProperties,
    ) -> Result<String, RemoteError>;

    /// Links two records; repeating the same link must not fail or duplicate it
    async fn create_association(
        &self,
        from: EntityType,
        from_id: &str,
        to: EntityType,
        to_id: &str,
        descriptor: &AssociationDescriptor,
    ) -> Result<(), RemoteError>;
}
