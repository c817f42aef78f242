//! Contact to company association
//!
//! Missing identities are a skip, not an error: nothing is sent to the CRM
//! and the reason is logged.

use crate::crm::{AssociationDescriptor, CrmApi, DestinationIdentity, EntityType};
use crate::remote::ResilientClient;
use crate::SyncError;
use std::fmt;

/// Why an association was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    MissingContactIdentity,
    MissingCompanyIdentity,
    LocationUnavailable,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingContactIdentity => "missing contact identity",
            Self::MissingCompanyIdentity => "missing company identity",
            Self::LocationUnavailable => "location data unavailable",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one association attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationOutcome {
    Created,
    Skipped(SkipReason),
}

/// Links resolved contacts to resolved companies
pub struct AssociationBuilder<'a> {
    crm: &'a dyn CrmApi,
    remote: &'a ResilientClient,
    descriptor: AssociationDescriptor,
}

impl<'a> AssociationBuilder<'a> {
    pub fn new(crm: &'a dyn CrmApi, remote: &'a ResilientClient) -> Self {
        Self {
            crm,
            remote,
            descriptor: AssociationDescriptor::CONTACT_TO_COMPANY,
        }
    }

    /// Associates a contact with a company
    ///
    /// # Returns
    ///
    /// * `Ok(Created)` - The association exists (new or already present)
    /// * `Ok(Skipped(_))` - An identity was missing; no remote call was made
    /// * `Err(SyncError::AssociationFailed)` - The CRM refused or kept failing
    pub async fn associate(
        &self,
        contact: Option<&DestinationIdentity>,
        company: Option<&DestinationIdentity>,
    ) -> Result<AssociationOutcome, SyncError> {
        let contact = match contact {
            Some(contact) => contact,
            None => return Ok(self.skip(None, SkipReason::MissingContactIdentity)),
        };
        let company = match company {
            Some(company) => company,
            None => return Ok(self.skip(Some(contact), SkipReason::MissingCompanyIdentity)),
        };

        let crm = self.crm;
        let descriptor = &self.descriptor;
        let operation = format!("associate contact {} with company {}", contact.id, company.id);

        self.remote
            .invoke(&operation, move || {
                crm.create_association(
                    EntityType::Contact,
                    &contact.id,
                    EntityType::Company,
                    &company.id,
                    descriptor,
                )
            })
            .await
            .map_err(|source| SyncError::AssociationFailed {
                contact_id: contact.id.clone(),
                company_id: company.id.clone(),
                source,
            })?;

        tracing::debug!(
            "Associated contact {} with company {}",
            contact.id,
            company.id
        );
        Ok(AssociationOutcome::Created)
    }

    /// Records a deliberate skip for `contact`
    pub fn skip(
        &self,
        contact: Option<&DestinationIdentity>,
        reason: SkipReason,
    ) -> AssociationOutcome {
        match contact {
            Some(contact) => tracing::warn!(
                "Skipping association for contact {} ({}): {}",
                contact.id,
                contact.natural_key,
                reason
            ),
            None => tracing::warn!("Skipping association: {}", reason),
        }
        AssociationOutcome::Skipped(reason)
    }
}
