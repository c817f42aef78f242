//! Client-side record selection
//!
//! The catalog cannot filter by these predicates server-side, so they run
//! after every page has been fetched.

use crate::catalog::ExternalRecord;

/// Which catalog records a full sync migrates
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every record in the catalog
    All,

    /// Record 1 plus every record whose id is prime
    #[default]
    IdOneAndPrimes,

    /// An explicit list of ids
    Ids(Vec<u64>),
}

impl Selection {
    /// Returns true if the record with this id is selected
    pub fn matches(&self, id: u64) -> bool {
        match self {
            Self::All => true,
            Self::IdOneAndPrimes => id == 1 || is_prime(id),
            Self::Ids(ids) => ids.contains(&id),
        }
    }

    /// Filters records, keeping catalog order
    pub fn apply(&self, records: Vec<ExternalRecord>) -> Vec<ExternalRecord> {
        records
            .into_iter()
            .filter(|record| self.matches(record.id))
            .collect()
    }
}

/// Trial-division primality check
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut divisor = 3;
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}
