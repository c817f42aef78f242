//! External catalog access
//!
//! This module contains everything needed to read the source catalog:
//! - Record types (characters and the locations they link to)
//! - The `CatalogSource` collaborator trait and its HTTP implementation
//! - Sequential, restartable pagination
//! - Client-side record selection

mod reader;
mod selection;
mod source;
mod types;

pub use reader::{CatalogReader, PageStream};
pub use selection::{is_prime, Selection};
pub use source::{CatalogSource, HttpCatalog};
pub use types::{CatalogPage, ExternalRecord, LocationRecord, RelationLink};
