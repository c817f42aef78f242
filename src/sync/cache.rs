use crate::crm::DestinationIdentity;
use std::collections::HashMap;

/// Run-scoped map from relation link URL to the company resolved for it
///
/// Built during the company phase, read during the association phase, and
/// dropped with the run.
#[derive(Debug, Default)]
pub struct IdentityCache {
    companies: HashMap<String, DestinationIdentity>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, link: impl Into<String>, identity: DestinationIdentity) {
        self.companies.insert(link.into(), identity);
    }

    pub fn get(&self, link: &str) -> Option<&DestinationIdentity> {
        self.companies.get(link)
    }

    pub fn contains(&self, link: &str) -> bool {
        self.companies.contains_key(link)
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}
