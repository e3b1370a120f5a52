#![allow(clippy::unwrap_used)]
// Integration tests for `RestStore` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use keyline_api::{DocumentStore, Error, Fields, RestStore, StoreConfig, Value};

// ── Helpers ─────────────────────────────────────────────────────────

const ROOT: &str = "/v1/projects/demo/databases/(default)/documents";

async fn setup() -> (MockServer, RestStore) {
    let server = MockServer::start().await;
    let mut config = StoreConfig::new("demo").unwrap();
    config.base_url = Url::parse(&format!("{}/v1/", server.uri())).unwrap();
    let store = RestStore::with_client(reqwest::Client::new(), &config).unwrap();
    (server, store)
}

async fn setup_with_key(key: &str) -> (MockServer, RestStore) {
    let server = MockServer::start().await;
    let mut config = StoreConfig::new("demo").unwrap();
    config.base_url = Url::parse(&format!("{}/v1/", server.uri())).unwrap();
    let config = config.with_api_key(key.to_string().into());
    let store = RestStore::with_client(reqwest::Client::new(), &config).unwrap();
    (server, store)
}

fn doc_name(collection: &str, id: &str) -> String {
    format!("projects/demo/databases/(default)/documents/{collection}/{id}")
}

// ── Point reads ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_decodes_typed_fields() {
    let (server, store) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/licenses/LICENSE-1-ABC")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": doc_name("licenses", "LICENSE-1-ABC"),
            "fields": {
                "plan": { "stringValue": "Classic" },
                "durationDays": { "integerValue": "30" },
                "isActive": { "booleanValue": true },
                "usedBy": { "nullValue": null }
            },
            "createTime": "2025-01-01T00:00:00.000000Z",
            "updateTime": "2025-01-01T00:00:00.000000Z"
        })))
        .mount(&server)
        .await;

    let doc = store.get("licenses", "LICENSE-1-ABC").await.unwrap().unwrap();
    assert_eq!(doc.id(), "LICENSE-1-ABC");

    let fields = doc.fields.unwrap();
    assert_eq!(fields.str_field("plan"), Some("Classic"));
    assert_eq!(fields.int_field("durationDays"), Some(30));
    assert_eq!(fields.bool_field("isActive"), Some(true));
    assert!(!fields.has("usedBy"));
}

#[tokio::test]
async fn test_get_missing_document_is_none() {
    let (server, store) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/users/ghost")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    assert!(store.get("users", "ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_api_key_is_sent_as_query_param() {
    let (server, store) = setup_with_key("test-key").await;

    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/users/u1")))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": doc_name("users", "u1"),
            "fields": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = store.get("users", "u1").await.unwrap().unwrap();
    assert!(doc.fields.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_key_maps_to_invalid_api_key() {
    let (server, store) = setup_with_key("bad").await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "denied", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let result = store.get("users", "u1").await;
    assert!(
        matches!(result, Err(Error::InvalidApiKey)),
        "expected InvalidApiKey, got: {result:?}"
    );
}

#[tokio::test]
async fn test_structured_error_is_parsed() {
    let (server, store) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "backend exploded", "status": "INTERNAL" }
        })))
        .mount(&server)
        .await;

    let err = store.get("users", "u1").await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.api_error_code(), Some("INTERNAL"));
    assert!(err.to_string().contains("backend exploded"));
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_patches_whole_document() {
    let (server, store) = setup().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{ROOT}/licenses/K1")))
        .and(body_partial_json(json!({
            "fields": {
                "plan": { "stringValue": "Pro" },
                "durationDays": { "integerValue": "90" },
                "usedBy": { "nullValue": null }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": doc_name("licenses", "K1"),
            "fields": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fields = Fields::new()
        .with("plan", "Pro")
        .with("durationDays", 90_i64)
        .with("usedBy", Value::Null);
    store.set("licenses", "K1", fields).await.unwrap();
}

#[tokio::test]
async fn test_patch_sends_update_mask() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("{ROOT}:batchWrite")))
        .and(body_partial_json(json!({
            "writes": [{
                "update": {
                    "name": doc_name("users", "u1"),
                    "fields": {
                        "messagesUsed": { "integerValue": "0" },
                        "lastMessageReset": { "integerValue": "1700000000000" }
                    }
                },
                "updateMask": { "fieldPaths": ["lastMessageReset", "messagesUsed"] }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{ "updateTime": "2025-01-01T00:00:00Z" }],
            "status": [{}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fields = Fields::new()
        .with("messagesUsed", 0_i64)
        .with("lastMessageReset", 1_700_000_000_000_i64);
    store.patch("users", "u1", fields).await.unwrap();
}

#[tokio::test]
async fn test_patch_surfaces_rejected_write() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("{ROOT}:batchWrite")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{}],
            "status": [{ "code": 7, "message": "Missing or insufficient permissions." }]
        })))
        .mount(&server)
        .await;

    let result = store
        .patch("users", "u1", Fields::new().with("plan", "Free"))
        .await;
    match result {
        Err(Error::Write { index, code, message }) => {
            assert_eq!(index, 0);
            assert_eq!(code, 7);
            assert!(message.contains("permissions"));
        }
        other => panic!("expected Write error, got: {other:?}"),
    }
}

// ── Queries ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_query_eq_skips_entries_without_document() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("{ROOT}:runQuery")))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{ "collectionId": "licenses" }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "key" },
                        "op": "EQUAL",
                        "value": { "stringValue": "LICENSE-1-ABC" }
                    }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "document": {
                    "name": doc_name("licenses", "doc-42"),
                    "fields": { "key": { "stringValue": "LICENSE-1-ABC" } }
                },
                "readTime": "2025-01-01T00:00:00Z"
            },
            { "readTime": "2025-01-01T00:00:00Z" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let hits = store
        .query_eq("licenses", "key", Value::from("LICENSE-1-ABC"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id(), "doc-42");
}

#[tokio::test]
async fn test_query_eq_with_no_matches() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("{ROOT}:runQuery")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "readTime": "2025-01-01T00:00:00Z" }])),
        )
        .mount(&server)
        .await;

    let hits = store
        .query_eq("licenses", "createdBy", Value::from("nobody"))
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("{ROOT}:runQuery")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = store
        .query_eq("licenses", "key", Value::from("x"))
        .await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_transport_error_does_not_expose_api_key() {
    let mut config = StoreConfig::new("demo").unwrap();
    // Nothing listens on the discard port.
    config.base_url = Url::parse("http://127.0.0.1:9/v1/").unwrap();
    let config = config.with_api_key("SUPERSECRET123".to_string().into());
    let store = RestStore::with_client(reqwest::Client::new(), &config).unwrap();

    let err = store.get("users", "u1").await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert!(!err.to_string().contains("SUPERSECRET123"), "{err}");
    assert!(!format!("{err:?}").contains("SUPERSECRET123"), "{err:?}");
}
