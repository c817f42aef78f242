use serde::Deserialize;

/// A character snapshot fetched from the catalog
///
/// Lives for one sync run; never persisted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub species: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub gender: String,
    /// Where the character comes from; becomes the related company
    #[serde(default)]
    pub origin: RelationLink,
    #[serde(default)]
    pub location: RelationLink,
    #[serde(default)]
    pub url: String,
}

impl ExternalRecord {
    /// URL of the origin location, if the catalog knows it
    pub fn origin_link(&self) -> Option<&str> {
        self.origin.link()
    }
}

/// A named link to another catalog record
///
/// The catalog reports unknown relations as an empty URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct RelationLink {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl RelationLink {
    /// Returns the URL if the relation is known
    pub fn link(&self) -> Option<&str> {
        let url = self.url.trim();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }
}

/// A location reached through a relation link
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationRecord {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub location_type: String,
    #[serde(default)]
    pub dimension: String,
    #[serde(default)]
    pub url: String,
}

/// One page of the catalog listing
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub records: Vec<ExternalRecord>,

    /// Continuation cursor; `None` on the last page
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_character() {
        let json = r#"{
            "id": 1,
            "name": "Rick Sanchez",
            "status": "Alive",
            "species": "Human",
            "type": "",
            "gender": "Male",
            "origin": {"name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1"},
            "location": {"name": "Citadel of Ricks", "url": "https://rickandmortyapi.com/api/location/3"},
            "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
            "episode": ["https://rickandmortyapi.com/api/episode/1"],
            "url": "https://rickandmortyapi.com/api/character/1",
            "created": "2017-11-04T18:48:46.250Z"
        }"#;

        let record: ExternalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.name, "Rick Sanchez");
        assert_eq!(
            record.origin_link(),
            Some("https://rickandmortyapi.com/api/location/1")
        );
    }

    #[test]
    fn test_unknown_origin_has_no_link() {
        let json = r#"{"id": 7, "name": "Abradolf Lincler", "origin": {"name": "unknown", "url": ""}}"#;
        let record: ExternalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.origin_link(), None);
        assert_eq!(record.origin.name, "unknown");
    }

    #[test]
    fn test_deserialize_location() {
        let json = r#"{"id": 1, "name": "Earth (C-137)", "type": "Planet", "dimension": "Dimension C-137", "url": "https://rickandmortyapi.com/api/location/1"}"#;
        let location: LocationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(location.location_type, "Planet");
        assert_eq!(location.dimension, "Dimension C-137");
    }
}
