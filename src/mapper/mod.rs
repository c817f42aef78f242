//! Catalog record to CRM property mapping
//!
//! Pure functions: no I/O, no side effects, same input gives same output.

mod email;
mod properties;

pub use email::{derive_email, is_valid_email, normalize_name};
pub use properties::MappedProperties;

use crate::catalog::{ExternalRecord, LocationRecord};
use crate::config::MappingConfig;

/// Contact property holding the stable catalog id; the contact natural key
pub const CONTACT_KEY_PROPERTY: &str = "character_id";

/// Company property used as the company natural key
pub const COMPANY_KEY_PROPERTY: &str = "name";

/// Maps a character to contact properties
///
/// # Arguments
///
/// * `record` - The catalog character
/// * `settings` - Email domain and lifecycle stage defaults
pub fn to_contact_properties(record: &ExternalRecord, settings: &MappingConfig) -> MappedProperties {
    let mut props = MappedProperties::new();

    props.insert(
        "email",
        derive_email(&record.name, record.id, &settings.email_domain),
    );

    let (first, last) = split_name(&record.name);
    props.insert("firstname", first);
    if !last.is_empty() {
        props.insert("lastname", last);
    }

    props.insert(CONTACT_KEY_PROPERTY, record.id.to_string());
    props.insert("status_character", record.status.as_str());
    props.insert("character_species", record.species.as_str());
    props.insert("character_gender", record.gender.as_str());
    props.insert("lifecyclestage", settings.lifecycle_stage.as_str());

    props
}

/// Maps a location to company properties
pub fn to_company_properties(location: &LocationRecord) -> MappedProperties {
    let mut props = MappedProperties::new();
    props.insert(COMPANY_KEY_PROPERTY, location.name.as_str());
    props.insert("location_id", location.id.to_string());
    props.insert("location_type", location.location_type.as_str());
    props.insert("dimension", location.dimension.as_str());
    props
}

/// Splits a display name at its first whitespace run
fn split_name(name: &str) -> (&str, &str) {
    let name = name.trim();
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (name, ""),
    }
}
