//! Sync run summary
//!
//! Per-record failures end up here as counters rather than as errors.

use crate::sync::{AssociationOutcome, UpsertOutcome};

/// Counters accumulated over one full sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Records chosen by the selection predicate
    pub records_selected: usize,

    pub contacts_created: usize,
    pub contacts_updated: usize,
    pub contacts_failed: usize,

    /// Distinct companies resolved (created or updated)
    pub companies_processed: usize,
    pub companies_failed: usize,

    pub associations_created: usize,
    pub associations_skipped: usize,
    pub associations_failed: usize,
}

impl SyncSummary {
    pub(crate) fn record_contact(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.contacts_created += 1,
            UpsertOutcome::Updated => self.contacts_updated += 1,
        }
    }

    pub(crate) fn record_association(&mut self, outcome: AssociationOutcome) {
        match outcome {
            AssociationOutcome::Created => self.associations_created += 1,
            AssociationOutcome::Skipped(_) => self.associations_skipped += 1,
        }
    }

    /// Contacts that made it into the destination
    pub fn contacts_resolved(&self) -> usize {
        self.contacts_created + self.contacts_updated
    }

    /// Returns true if no record, company or association failed
    pub fn is_clean(&self) -> bool {
        self.contacts_failed == 0 && self.companies_failed == 0 && self.associations_failed == 0
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &SyncSummary) {
    println!("=== Sync Summary ===\n");

    println!("Records selected: {}", summary.records_selected);
    println!();

    println!("Contacts:");
    println!("  Created: {}", summary.contacts_created);
    println!("  Updated: {}", summary.contacts_updated);
    println!("  Failed: {}", summary.contacts_failed);
    println!();

    println!("Companies:");
    println!("  Processed: {}", summary.companies_processed);
    println!("  Failed: {}", summary.companies_failed);
    println!();

    println!("Associations:");
    println!("  Created: {}", summary.associations_created);
    println!("  Skipped: {}", summary.associations_skipped);
    println!("  Failed: {}", summary.associations_failed);
    println!();

    let success_rate = if summary.records_selected > 0 {
        (summary.contacts_resolved() as f64 / summary.records_selected as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} records synced)",
        success_rate,
        summary.contacts_resolved(),
        summary.records_selected
    );
}
