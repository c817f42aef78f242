//! HubSpot CRM client
//!
//! Objects go through the CRM v3 API, associations through v4 (whose PUT
//! endpoint is idempotent).

use crate::crm::{AssociationDescriptor, CrmApi, CrmObject, EntityType};
use crate::mapper::MappedProperties;
use crate::remote::{check_response, classify_reqwest_error, read_json, RemoteError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    #[serde(rename = "filterGroups")]
    filter_groups: Vec<FilterGroup<'a>>,
    properties: Vec<&'a str>,
    limit: usize,
}

#[derive(Debug, Serialize)]
struct FilterGroup<'a> {
    filters: Vec<Filter<'a>>,
}

#[derive(Debug, Serialize)]
struct Filter<'a> {
    #[serde(rename = "propertyName")]
    property_name: &'a str,
    operator: &'static str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<HubspotObject>,
}

#[derive(Debug, Deserialize)]
struct HubspotObject {
    id: String,
    #[serde(default)]
    properties: HashMap<String, Option<String>>,
}

impl From<HubspotObject> for CrmObject {
    fn from(object: HubspotObject) -> Self {
        Self {
            id: object.id,
            properties: object
                .properties
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v)))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ObjectInput<'a> {
    properties: &'a MappedProperties,
}

#[derive(Debug, Serialize)]
struct AssociationSpec {
    #[serde(rename = "associationCategory")]
    association_category: &'static str,
    #[serde(rename = "associationTypeId")]
    association_type_id: u32,
}

/// One HubSpot account, authenticated with a private app token
#[derive(Clone)]
pub struct HubSpotCrm {
    client: Client,
    base_url: String,
    token: String,
}

impl HubSpotCrm {
    /// Creates a client for the account behind `token`
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `base_url` - API root, normally "https://api.hubapi.com"
    /// * `token` - Private app access token
    pub fn new(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        check_response(response).await
    }
}

impl std::fmt::Debug for HubSpotCrm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubSpotCrm")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CrmApi for HubSpotCrm {
    async fn search(
        &self,
        entity: EntityType,
        property: &str,
        value: &str,
        limit: usize,
    ) -> Result<Vec<CrmObject>, RemoteError> {
        let url = format!(
            "{}/crm/v3/objects/{}/search",
            self.base_url,
            entity.as_path()
        );
        let body = SearchRequest {
            filter_groups: vec![FilterGroup {
                filters: vec![Filter {
                    property_name: property,
                    operator: "EQ",
                    value,
                }],
            }],
            properties: vec![property],
            limit,
        };

        let response = self.send(self.client.post(url).json(&body)).await?;
        let body: SearchResponse = read_json(response).await?;
        Ok(body.results.into_iter().map(CrmObject::from).collect())
    }

    async fn create(
        &self,
        entity: EntityType,
        properties: &MappedProperties,
    ) -> Result<String, RemoteError> {
        let url = format!("{}/crm/v3/objects/{}", self.base_url, entity.as_path());
        let response = self
            .send(self.client.post(url).json(&ObjectInput { properties }))
            .await?;
        let created: HubspotObject = read_json(response).await?;
        Ok(created.id)
    }

    async fn update(
        &self,
        entity: EntityType,
        id: &str,
        properties: &MappedProperties,
    ) -> Result<String, RemoteError> {
        let url = format!(
            "{}/crm/v3/objects/{}/{}",
            self.base_url,
            entity.as_path(),
            id
        );
        let response = self
            .send(self.client.patch(url).json(&ObjectInput { properties }))
            .await?;
        let updated: HubspotObject = read_json(response).await?;
        Ok(updated.id)
    }

    async fn create_association(
        &self,
        from: EntityType,
        from_id: &str,
        to: EntityType,
        to_id: &str,
        descriptor: &AssociationDescriptor,
    ) -> Result<(), RemoteError> {
        let url = format!(
            "{}/crm/v4/objects/{}/{}/associations/{}/{}",
            self.base_url,
            from.as_path(),
            from_id,
            to.as_path(),
            to_id
        );
        let body = [AssociationSpec {
            association_category: descriptor.category,
            association_type_id: descriptor.type_id,
        }];

        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }
}
