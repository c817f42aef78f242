//! Sync run phase definitions
//!
//! A run moves forward through these phases; `Failed` is only reached when
//! the set of records to migrate cannot be fetched.
use std::fmt;

/// Represents the current phase of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    /// No run in progress
    Idle,

    /// Reading the catalog and resolving the companies it references
    FetchingCompanies,

    /// Resolving one contact per selected record
    FetchingContacts,

    /// Linking resolved contacts to their companies
    Associating,

    /// Run finished; the summary is final
    Done,

    /// The initial catalog fetch failed
    Failed,
}

impl SyncPhase {
    /// Returns true if no further transitions are expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: SyncPhase) -> bool {
        match (self, next) {
            (Self::Idle, Self::FetchingCompanies) => true,
            (Self::FetchingCompanies, Self::FetchingContacts) => true,
            (Self::FetchingContacts, Self::Associating) => true,
            (Self::Associating, Self::Done) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingCompanies => "fetching_companies",
            Self::FetchingContacts => "fetching_contacts",
            Self::Associating => "associating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
