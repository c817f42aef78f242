//! Integration tests for the catalog and CRM clients
//!
//! These tests use wiremock to stand in for the catalog and the CRM and
//! exercise the HTTP clients, the retry loop and a full sync end-to-end.

use catalog_sync::catalog::{CatalogReader, CatalogSource, HttpCatalog, Selection};
use catalog_sync::crm::{AssociationDescriptor, CrmApi, HubSpotCrm, InMemoryCrm};
use catalog_sync::mapper::MappedProperties;
use catalog_sync::remote::{build_http_client, InvokeError, RemoteError, ResilientClient, RetryPolicy};
use catalog_sync::{EntityType, SyncEngine, SyncPhase};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "pat-test-token";

/// Short delays so retried tests stay fast
fn fast_remote() -> ResilientClient {
    ResilientClient::new(RetryPolicy::new(
        3,
        Duration::from_millis(5),
        Duration::from_millis(20),
    ))
}

fn character(id: u64, name: &str, origin_url: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "status": "Alive",
        "species": "Human",
        "type": "",
        "gender": "Male",
        "origin": {"name": "Earth (C-137)", "url": origin_url},
        "location": {"name": "Citadel of Ricks", "url": ""},
        "url": format!("https://rickandmortyapi.com/api/character/{}", id)
    })
}

/// Mounts a two-page character listing; page 2 is reached through `info.next`
async fn mount_catalog(server: &MockServer) {
    let base_url = server.uri();
    let earth = format!("{}/location/1", base_url);

    Mock::given(method("GET"))
        .and(path("/character"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": {"count": 5, "pages": 2, "next": null, "prev": format!("{}/character", base_url)},
            "results": [
                character(4, "Beth Smith", &earth),
                character(5, "Jerry Smith", "")
            ]
        })))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/character"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": {"count": 5, "pages": 2, "next": format!("{}/character?page=2", base_url), "prev": null},
            "results": [
                character(1, "Rick Sanchez", &earth),
                character(2, "Morty Smith", &earth),
                character(3, "Summer Smith", &earth)
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/location/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "Earth (C-137)",
            "type": "Planet",
            "dimension": "Dimension C-137",
            "url": earth
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_catalog_pagination_follows_next_cursor() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let catalog = HttpCatalog::new(build_http_client().unwrap(), server.uri());
    let remote = fast_remote();
    let reader = CatalogReader::new(&catalog, &remote);

    let mut pages = reader.pages();
    let first = pages.next_page().await.unwrap().unwrap();
    let second = pages.next_page().await.unwrap().unwrap();
    assert!(pages.next_page().await.is_none());

    let first_ids: Vec<u64> = first.iter().map(|r| r.id).collect();
    let second_ids: Vec<u64> = second.iter().map(|r| r.id).collect();
    assert_eq!(first_ids, vec![1, 2, 3]);
    assert_eq!(second_ids, vec![4, 5]);

    // A fresh pass starts over from the first page
    let selected = reader
        .read_selected(&Selection::IdOneAndPrimes)
        .await
        .unwrap();
    let ids: Vec<u64> = selected.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 5]);
}

#[tokio::test]
async fn test_catalog_relation_link() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let catalog = HttpCatalog::new(build_http_client().unwrap(), server.uri());
    let location = catalog
        .get_by_relation_link(&format!("{}/location/1", server.uri()))
        .await
        .unwrap();

    assert_eq!(location.id, 1);
    assert_eq!(location.name, "Earth (C-137)");
    assert_eq!(location.location_type, "Planet");
}

#[tokio::test]
async fn test_hubspot_search_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts/search"))
        .and(header("authorization", "Bearer pat-test-token"))
        .and(body_partial_json(json!({
            "filterGroups": [{"filters": [{"propertyName": "character_id", "operator": "EQ", "value": "1"}]}],
            "limit": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "results": [{"id": "701", "properties": {"character_id": "1", "hs_object_id": "701"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let crm = HubSpotCrm::new(build_http_client().unwrap(), server.uri(), TOKEN);
    let found = crm
        .search(EntityType::Contact, "character_id", "1", 1)
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "701");
    assert_eq!(found[0].properties.get("character_id"), Some("1"));
}

#[tokio::test]
async fn test_hubspot_create_and_update_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/companies"))
        .and(header("authorization", "Bearer pat-test-token"))
        .and(body_partial_json(json!({"properties": {"name": "Earth (C-137)"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "901",
            "properties": {"name": "Earth (C-137)"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/crm/v3/objects/companies/901"))
        .and(body_partial_json(json!({"properties": {"dimension": "Replacement Dimension"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "901",
            "properties": {"dimension": "Replacement Dimension"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let crm = HubSpotCrm::new(build_http_client().unwrap(), server.uri(), TOKEN);

    let created: MappedProperties = [("name", "Earth (C-137)")].into_iter().collect();
    let id = crm.create(EntityType::Company, &created).await.unwrap();
    assert_eq!(id, "901");

    let changed: MappedProperties = [("dimension", "Replacement Dimension")]
        .into_iter()
        .collect();
    let id = crm.update(EntityType::Company, "901", &changed).await.unwrap();
    assert_eq!(id, "901");
}

#[tokio::test]
async fn test_hubspot_association_request() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/crm/v4/objects/contacts/701/associations/companies/901"))
        .and(body_partial_json(json!([
            {"associationCategory": "HUBSPOT_DEFINED", "associationTypeId": 279}
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fromObjectTypeId": "0-1",
            "fromObjectId": 701,
            "toObjectTypeId": "0-2",
            "toObjectId": 901,
            "labels": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let crm = HubSpotCrm::new(build_http_client().unwrap(), server.uri(), TOKEN);
    crm.create_association(
        EntityType::Contact,
        "701",
        EntityType::Company,
        "901",
        &AssociationDescriptor::CONTACT_TO_COMPANY,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_rate_limited_call_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "42", "properties": {}})))
        .mount(&server)
        .await;

    let crm = HubSpotCrm::new(build_http_client().unwrap(), server.uri(), TOKEN);
    let remote = fast_remote();
    let properties: MappedProperties = [("character_id", "1")].into_iter().collect();

    let id = remote
        .invoke("create contact", || crm.create(EntityType::Contact, &properties))
        .await
        .unwrap();

    assert_eq!(id, "42");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "message": "Property values were not valid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let crm = HubSpotCrm::new(build_http_client().unwrap(), server.uri(), TOKEN);
    let remote = fast_remote();
    let properties: MappedProperties = [("email", "not-an-email")].into_iter().collect();

    let result = remote
        .invoke("create contact", || crm.create(EntityType::Contact, &properties))
        .await;

    match result {
        Err(InvokeError::NonRetryable { source, .. }) => {
            assert!(matches!(source, RemoteError::Rejected { status: 400, .. }));
        }
        other => panic!("expected NonRetryable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/character"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let catalog: Arc<dyn CatalogSource> =
        Arc::new(HttpCatalog::new(build_http_client().unwrap(), server.uri()));
    let crm = Arc::new(InMemoryCrm::new());
    let mut engine = SyncEngine::new(catalog, crm.clone(), fast_remote());

    let result = engine.run_full_sync().await;

    assert!(result.is_err());
    assert_eq!(engine.phase(), SyncPhase::Failed);
    assert_eq!(crm.calls().total(), 0);
}

#[tokio::test]
async fn test_full_sync_end_to_end() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let catalog: Arc<dyn CatalogSource> =
        Arc::new(HttpCatalog::new(build_http_client().unwrap(), server.uri()));
    let crm = Arc::new(InMemoryCrm::new());
    let mut engine = SyncEngine::new(catalog, crm.clone(), fast_remote())
        .with_selection(Selection::All);

    let first = engine.run_full_sync().await.unwrap();

    assert_eq!(engine.phase(), SyncPhase::Done);
    assert_eq!(first.records_selected, 5);
    assert_eq!(first.contacts_created, 5);
    assert_eq!(first.companies_processed, 1);
    assert_eq!(first.associations_created, 4);
    assert_eq!(first.associations_skipped, 1);

    let contacts = crm.records(EntityType::Contact);
    assert_eq!(
        contacts[0].properties.get("email"),
        Some("ricksanchez1@rickandmorty.com")
    );
    assert_eq!(contacts[0].properties.get("firstname"), Some("Rick"));
    assert_eq!(contacts[0].properties.get("lastname"), Some("Sanchez"));

    let second = engine.run_full_sync().await.unwrap();

    assert_eq!(second.contacts_created, 0);
    assert_eq!(second.contacts_updated, 5);
    assert_eq!(crm.record_count(EntityType::Contact), 5);
    assert_eq!(crm.record_count(EntityType::Company), 1);
    assert_eq!(crm.associations().len(), 4);
}

/// Serves a 200 whose body is cut off mid-stream, counting connections
async fn spawn_truncating_server() -> (String, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicU32::new(0));
    let counter = connections.clone();

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => return,
            };
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let response = "HTTP/1.1 200 OK\r\n\
                    Content-Type: application/json\r\n\
                    Content-Length: 1000\r\n\r\n\
                    {\"info\": {\"next\": null}, \"results\": [{\"id\": 1";
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), connections)
}

#[tokio::test]
async fn test_connection_dropped_mid_body_is_retried() {
    let (base_url, connections) = spawn_truncating_server().await;

    let catalog = HttpCatalog::new(build_http_client().unwrap(), base_url);
    let remote = fast_remote();
    let reader = CatalogReader::new(&catalog, &remote);

    let result = reader.read_all().await;

    match result {
        Err(InvokeError::RetriesExhausted {
            attempts, source, ..
        }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(source, RemoteError::Connection(_)), "got {:?}", source);
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
    assert_eq!(connections.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_refused_connection_is_transient() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let catalog = HttpCatalog::new(build_http_client().unwrap(), format!("http://{}", addr));
    let remote = fast_remote();

    let result = remote
        .invoke("catalog page 1", || catalog.list_page(None))
        .await;

    match result {
        Err(InvokeError::RetriesExhausted {
            attempts, source, ..
        }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(source, RemoteError::Connection(_)), "got {:?}", source);
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_request_timeout_status_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/character/1"))
        .respond_with(ResponseTemplate::new(408))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/character/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(character(1, "Rick Sanchez", "")))
        .mount(&server)
        .await;

    let catalog = HttpCatalog::new(build_http_client().unwrap(), server.uri());
    let remote = fast_remote();
    let reader = CatalogReader::new(&catalog, &remote);

    let record = reader.get_by_id(1).await.unwrap();

    assert_eq!(record.name, "Rick Sanchez");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/location/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Location not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = HttpCatalog::new(build_http_client().unwrap(), server.uri());
    let remote = fast_remote();
    let reader = CatalogReader::new(&catalog, &remote);

    let result = reader
        .get_by_relation_link(&format!("{}/location/99", server.uri()))
        .await;

    match result {
        Err(InvokeError::NonRetryable { source, .. }) => {
            assert_eq!(source.status(), Some(404));
        }
        other => panic!("expected NonRetryable, got {:?}", other),
    }
}
