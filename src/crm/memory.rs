//! In-process CRM
//!
//! Behaves like the remote CRM for search, create, update and associate,
//! counts every call, and can be told to fail specific operations. Used for
//! dry runs and as a test double.

use crate::crm::{AssociationDescriptor, CrmApi, CrmObject, EntityType};
use crate::mapper::MappedProperties;
use crate::remote::RemoteError;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// CRM operation kinds, for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrmOperation {
    Search,
    Create,
    Update,
    Associate,
}

/// Number of calls received per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub search: u32,
    pub create: u32,
    pub update: u32,
    pub associate: u32,
}

impl CallCounts {
    pub fn total(&self) -> u32 {
        self.search + self.create + self.update + self.associate
    }
}

/// A stored association between two records
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoredAssociation {
    pub from_type: &'static str,
    pub from_id: String,
    pub to_type: &'static str,
    pub to_id: String,
    pub type_id: u32,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    records: HashMap<EntityType, Vec<CrmObject>>,
    associations: BTreeSet<StoredAssociation>,
    calls: CallCounts,
    failures: VecDeque<(CrmOperation, RemoteError)>,
}

impl MemoryState {
    fn record(&mut self, operation: CrmOperation) -> Result<(), RemoteError> {
        match operation {
            CrmOperation::Search => self.calls.search += 1,
            CrmOperation::Create => self.calls.create += 1,
            CrmOperation::Update => self.calls.update += 1,
            CrmOperation::Associate => self.calls.associate += 1,
        }

        let position = self.failures.iter().position(|(op, _)| *op == operation);
        match position.and_then(|index| self.failures.remove(index)) {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }

    fn insert(&mut self, entity: EntityType, properties: &MappedProperties) -> String {
        self.next_id += 1;
        let id = self.next_id.to_string();
        self.records.entry(entity).or_default().push(CrmObject {
            id: id.clone(),
            properties: properties.clone(),
        });
        id
    }
}

/// CRM held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryCrm {
    state: Mutex<MemoryState>,
}

impl InMemoryCrm {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a record directly, bypassing call counting
    pub fn seed(&self, entity: EntityType, properties: MappedProperties) -> String {
        self.lock().insert(entity, &properties)
    }

    /// Makes the next call of `operation` fail with `error`
    ///
    /// Queued failures are consumed in order, one per matching call.
    pub fn fail_next(&self, operation: CrmOperation, error: RemoteError) {
        self.lock().failures.push_back((operation, error));
    }

    /// Snapshot of the records of one kind, in creation order
    pub fn records(&self, entity: EntityType) -> Vec<CrmObject> {
        self.lock()
            .records
            .get(&entity)
            .cloned()
            .unwrap_or_default()
    }

    pub fn record_count(&self, entity: EntityType) -> usize {
        self.lock().records.get(&entity).map_or(0, Vec::len)
    }

    /// Snapshot of all associations, sorted
    pub fn associations(&self) -> Vec<StoredAssociation> {
        self.lock().associations.iter().cloned().collect()
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }
}

#[async_trait]
impl CrmApi for InMemoryCrm {
    async fn search(
        &self,
        entity: EntityType,
        property: &str,
        value: &str,
        limit: usize,
    ) -> Result<Vec<CrmObject>, RemoteError> {
        let mut state = self.lock();
        state.record(CrmOperation::Search)?;

        Ok(state
            .records
            .get(&entity)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| record.properties.get(property) == Some(value))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(
        &self,
        entity: EntityType,
        properties: &MappedProperties,
    ) -> Result<String, RemoteError> {
        let mut state = self.lock();
        state.record(CrmOperation::Create)?;
        Ok(state.insert(entity, properties))
    }

    async fn update(
        &self,
        entity: EntityType,
        id: &str,
        properties: &MappedProperties,
    ) -> Result<String, RemoteError> {
        let mut state = self.lock();
        state.record(CrmOperation::Update)?;

        let record = state
            .records
            .get_mut(&entity)
            .and_then(|records| records.iter_mut().find(|record| record.id == id))
            .ok_or_else(|| RemoteError::Rejected {
                status: 404,
                body: format!("{} {} not found", entity, id),
            })?;
        record.properties.merge(properties);
        Ok(record.id.clone())
    }

    async fn create_association(
        &self,
        from: EntityType,
        from_id: &str,
        to: EntityType,
        to_id: &str,
        descriptor: &AssociationDescriptor,
    ) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record(CrmOperation::Associate)?;

        let exists = |entity: EntityType, id: &str| {
            state
                .records
                .get(&entity)
                .is_some_and(|records| records.iter().any(|record| record.id == id))
        };
        if !exists(from, from_id) || !exists(to, to_id) {
            return Err(RemoteError::Rejected {
                status: 404,
                body: format!("cannot associate {} {} with {} {}", from, from_id, to, to_id),
            });
        }

        state.associations.insert(StoredAssociation {
            from_type: from.as_path(),
            from_id: from_id.to_string(),
            to_type: to.as_path(),
            to_id: to_id.to_string(),
            type_id: descriptor.type_id,
        });
        Ok(())
    }
}
