//! Synchronization engine
//!
//! This module turns catalog records into CRM records:
//! - Natural-key upserts (`Resolver`)
//! - Contact to company associations (`AssociationBuilder`)
//! - The run-scoped company identity cache
//! - Phase tracking and the end-of-run summary
//! - `SyncEngine`, which sequences a full run and applies single changes

mod associations;
mod cache;
mod orchestrator;
mod phase;
mod resolver;
mod summary;

pub use associations::{AssociationBuilder, AssociationOutcome, SkipReason};
pub use cache::IdentityCache;
pub use orchestrator::SyncEngine;
pub use phase::SyncPhase;
pub use resolver::{Resolution, Resolver, SearchFailurePolicy, UpsertOutcome};
pub use summary::{print_summary, SyncSummary};
