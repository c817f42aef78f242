//! Catalog collaborator interface and its HTTP implementation

use crate::catalog::{CatalogPage, ExternalRecord, LocationRecord};
use crate::remote::{check_response, classify_reqwest_error, read_json, RemoteError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Read-only access to the external catalog
///
/// Each method is a single remote attempt; retries are the caller's concern.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches one page of records; `None` requests the first page
    async fn list_page(&self, cursor: Option<&str>) -> Result<CatalogPage, RemoteError>;

    /// Fetches a single record by its numeric id
    async fn get_by_id(&self, id: u64) -> Result<ExternalRecord, RemoteError>;

    /// Follows a relation link (e.g. a character's origin)
    async fn get_by_relation_link(&self, url: &str) -> Result<LocationRecord, RemoteError>;
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    info: PageInfo,
    #[serde(default)]
    results: Vec<ExternalRecord>,
}

/// Catalog served over HTTP in the `{info: {next}, results: []}` page shape
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    /// Creates a catalog client rooted at `base_url` (e.g. "https://rickandmortyapi.com/api")
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, RemoteError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        check_response(response).await
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn list_page(&self, cursor: Option<&str>) -> Result<CatalogPage, RemoteError> {
        let url = match cursor {
            Some(cursor) => cursor.to_string(),
            None => format!("{}/character", self.base_url),
        };

        tracing::debug!("Fetching catalog page: {}", url);
        let page: PageResponse = read_json(self.get(&url).await?).await?;

        Ok(CatalogPage {
            records: page.results,
            next_cursor: page.info.next.filter(|next| !next.is_empty()),
        })
    }

    async fn get_by_id(&self, id: u64) -> Result<ExternalRecord, RemoteError> {
        let url = format!("{}/character/{}", self.base_url, id);
        read_json(self.get(&url).await?).await
    }

    async fn get_by_relation_link(&self, url: &str) -> Result<LocationRecord, RemoteError> {
        read_json(self.get(url).await?).await
    }
}
