//! Destination CRM access
//!
//! This module defines the CRM collaborator and its implementations:
//! - `CrmApi`: search / create / update / associate, one attempt per call
//! - `HubSpotCrm`: HubSpot REST client, one instance per account
//! - `InMemoryCrm`: in-process store for dry runs and tests

mod api;
mod hubspot;
mod memory;
mod types;

pub use api::CrmApi;
pub use hubspot::HubSpotCrm;
pub use memory::{CallCounts, CrmOperation, InMemoryCrm, StoredAssociation};
pub use types::{AssociationDescriptor, CrmObject, DestinationIdentity, EntityType, NaturalKey};
