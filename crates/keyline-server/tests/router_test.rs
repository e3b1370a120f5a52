#![allow(clippy::unwrap_used)]
// Router tests driven through `tower::ServiceExt::oneshot` over the
// in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use keyline_api::{DocumentStore, Fields, MemoryStore};
use keyline_core::ServerConfig;
use keyline_server::{AppState, app};

// ── Helpers ─────────────────────────────────────────────────────────

fn setup(admin_token: Option<&str>) -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let config = ServerConfig {
        admin_token: admin_token.map(|t| t.to_string().into()),
        ..ServerConfig::default()
    };
    let router = app(AppState::new(store.clone(), &config));
    (store, router)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_bearer(mut req: Request<Body>, token: &str) -> Request<Body> {
    req.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    req
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn generate(router: &Router) -> String {
    let (status, body) = send(
        router,
        post_json(
            "/api/admin/licenses",
            &json!({ "plan": "Classic", "issuerId": "A1", "validityDays": 30 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["key"].as_str().unwrap().to_owned()
}

// ── Health ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let (_, router) = setup(None);
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ── Activation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_activate_round_trip_and_deactivate() {
    let (_, router) = setup(None);
    let key = generate(&router).await;

    let (status, body) = send(
        &router,
        post_json("/api/license/activate", &json!({ "licenseKey": format!("  {key} ") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["licenseId"], key.as_str());
    assert_eq!(body["message"], "License activated successfully");

    let (status, _) = send(
        &router,
        post_json(&format!("/api/admin/licenses/{key}/deactivate"), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &router,
        post_json("/api/license/activate", &json!({ "licenseKey": key })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "License key deactivated");
}

#[tokio::test]
async fn test_activate_missing_or_non_string_key() {
    let (_, router) = setup(None);
    for body in [json!({}), json!({ "licenseKey": "" }), json!({ "licenseKey": 42 })] {
        let (status, resp) = send(&router, post_json("/api/license/activate", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "License key is required");
    }
}

#[tokio::test]
async fn test_activate_unknown_key() {
    let (_, router) = setup(None);
    let (status, body) = send(
        &router,
        post_json("/api/license/activate", &json!({ "licenseKey": "LICENSE-0-NOPE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid license key");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (_, router) = setup(None);
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/license/activate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

// ── Daily reset ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_daily_reset_requires_user_id() {
    let (_, router) = setup(None);
    let (status, body) = send(&router, post_json("/api/daily-reset", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User ID is required");
}

#[tokio::test]
async fn test_daily_reset_unknown_user() {
    let (_, router) = setup(None);
    let (status, body) =
        send(&router, post_json("/api/daily-reset", &json!({ "userId": "ghost" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_daily_reset_expired_user() {
    let (store, router) = setup(None);
    store.seed(
        "users",
        "u1",
        Fields::new()
            .with("plan", "Pro")
            .with("messagesLimit", 1000_i64)
            .with("messagesUsed", 12_i64)
            .with("licenseExpiresAt", 1_i64),
    );

    let (status, body) =
        send(&router, post_json("/api/daily-reset", &json!({ "userId": "u1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "License expired, reverted to Free",
            "plan": "Free",
            "messagesLimit": 10,
            "messagesUsed": 0
        })
    );
}

#[tokio::test]
async fn test_daily_reset_new_day_and_noop() {
    let (store, router) = setup(None);
    store.seed(
        "users",
        "u1",
        Fields::new()
            .with("plan", "Classic")
            .with("messagesUsed", 99_i64)
            .with("lastMessageReset", 86_400_000_i64),
    );

    let (status, body) =
        send(&router, post_json("/api/daily-reset", &json!({ "userId": "u1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "Messages reset for today",
            "messagesLimit": 500,
            "messagesUsed": 0
        })
    );

    let (status, body) =
        send(&router, post_json("/api/daily-reset", &json!({ "userId": "u1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "No reset needed" }));
}

#[tokio::test]
async fn test_daily_reset_reports_state_when_write_fails() {
    let (store, router) = setup(None);
    store.seed(
        "users",
        "u1",
        Fields::new().with("plan", "Pro").with("licenseExpiresAt", 1_i64),
    );
    store.fail_writes(true);

    let (status, body) =
        send(&router, post_json("/api/daily-reset", &json!({ "userId": "u1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "Free");
}

// ── Admin ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_admin_routes_require_configured_token() {
    let (_, router) = setup(Some("s3cret"));
    let body = json!({ "plan": "Pro", "issuerId": "A1", "validityDays": 7 });

    let (status, resp) = send(&router, post_json("/api/admin/licenses", &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["message"], "Unauthorized");

    let req = with_bearer(post_json("/api/admin/licenses", &body), "wrong");
    let (status, _) = send(&router, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = with_bearer(post_json("/api/admin/licenses", &body), "s3cret");
    let (status, resp) = send(&router, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(resp["key"].as_str().unwrap().starts_with("LICENSE-"));

    // Public routes stay open.
    let (status, _) = send(&router, post_json("/api/daily-reset", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_validation() {
    let (store, router) = setup(None);
    let (status, body) = send(
        &router,
        post_json(
            "/api/admin/licenses",
            &json!({ "plan": "Pro", "issuerId": "A1", "validityDays": 0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_list_and_mark_used() {
    let (store, router) = setup(None);
    let key = generate(&router).await;

    let (status, _) = send(
        &router,
        post_json(
            &format!("/api/admin/licenses/{key}/use"),
            &json!({ "userId": "user-9" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let req = Request::get("/api/admin/licenses?issuerId=A1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["key"], key.as_str());
    assert_eq!(list[0]["usedBy"], "user-9");
    assert_eq!(list[0]["plan"], "Classic");

    let doc = store.get("licenses", &key).await.unwrap().unwrap();
    assert!(doc.fields.unwrap().has("usedAt"));
}

#[tokio::test]
async fn test_deactivate_unknown_license() {
    let (_, router) = setup(None);
    let (status, body) = send(
        &router,
        post_json("/api/admin/licenses/LICENSE-0-NOPE/deactivate", &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid license key");
}
