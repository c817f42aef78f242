use crate::mapper::MappedProperties;
use std::fmt;

/// CRM object kinds handled by the sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Contact,
    Company,
}

impl EntityType {
    /// Object type segment used in CRM API paths
    pub fn as_path(&self) -> &'static str {
        match self {
            Self::Contact => "contacts",
            Self::Company => "companies",
        }
    }

    /// Parses the singular or plural object name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "contact" | "contacts" => Some(Self::Contact),
            "company" | "companies" => Some(Self::Company),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contact => write!(f, "contact"),
            Self::Company => write!(f, "company"),
        }
    }
}

/// Attribute used to decide whether a destination record already exists
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub property: String,
    pub value: String,
}

impl NaturalKey {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Builds the key from a mapped property set, if the property is present and non-empty
    pub fn from_properties(props: &MappedProperties, property: &str) -> Option<Self> {
        props
            .get(property)
            .filter(|value| !value.trim().is_empty())
            .map(|value| Self::new(property, value))
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.property, self.value)
    }
}

/// A destination record's id plus the key it was resolved by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationIdentity {
    pub id: String,
    pub natural_key: NaturalKey,
}

/// A record as returned by a CRM search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmObject {
    pub id: String,
    pub properties: MappedProperties,
}

/// Relationship type between two CRM object kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssociationDescriptor {
    pub category: &'static str,
    pub type_id: u32,
}

impl AssociationDescriptor {
    /// Standard contact-to-company association
    pub const CONTACT_TO_COMPANY: Self = Self {
        category: "HUBSPOT_DEFINED",
        type_id: 279,
    };
}
