use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use server::routes::{self, auth};
use service::auth::TokenService;
use service::runtime;
use service::storage::MemoryStore;

const IMAGE_LIMIT: usize = 1024 * 1024;

async fn build_app() -> anyhow::Result<Router> {
    let stores = runtime::open_stores(Arc::new(MemoryStore::new()), IMAGE_LIMIT).await?;
    let state = auth::ServerState {
        identity: stores.identity,
        listings: stores.listings,
        revocations: stores.revocations,
        tokens: TokenService::new("test-secret", 1),
    };
    Ok(routes::build_router(state, CorsLayer::very_permissive(), IMAGE_LIMIT))
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&v)?))?,
        None => builder.body(Body::empty())?,
    };
    Ok(req)
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, body))
}

async fn register(app: &Router, name: &str, password: &str) -> anyhow::Result<(String, String)> {
    let req = request("POST", "/auth/register", None, Some(json!({"name": name, "password": password})))?;
    let (status, body) = send(app, req).await?;
    assert_eq!(status, StatusCode::CREATED, "register {name}: {body}");
    let id = body["id"].as_str().unwrap_or_default().to_string();
    let token = body["token"].as_str().unwrap_or_default().to_string();
    Ok((id, token))
}

fn drill() -> Value {
    json!({
        "title": "Drill",
        "phoneNumber": "555-1234",
        "address": "1 Main St",
        "imageUrl": "data:image/png;base64,iVBORw0KGgo="
    })
}

#[tokio::test]
async fn health_and_docs_are_public() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, request("GET", "/health", None, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = send(&app, request("GET", "/api-docs/openapi.json", None, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/items/{id}"].is_object());

    let input = &body["components"]["schemas"]["ItemInputDoc"];
    assert_eq!(input["properties"]["description"]["type"], "string");
    assert!(input["properties"]["description"]["nullable"].is_null());
    let required: Vec<&str> = input["required"].as_array().into_iter().flatten().filter_map(|v| v.as_str()).collect();
    assert!(required.contains(&"title"));
    assert!(!required.contains(&"description"));
    Ok(())
}

#[tokio::test]
async fn rental_scenario() -> anyhow::Result<()> {
    let app = build_app().await?;

    let (alice_id, alice_token) = register(&app, "alice", "pw1").await?;

    let req = request("POST", "/auth/register", None, Some(json!({"name": "alice", "password": "pw2"})))?;
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 1002);

    let req = request("POST", "/auth/login", None, Some(json!({"name": "alice", "password": "pw1"})))?;
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], alice_id.as_str());

    let req = request("POST", "/auth/login", None, Some(json!({"name": "alice", "password": "wrong"})))?;
    assert_eq!(send(&app, req).await?.0, StatusCode::UNAUTHORIZED);

    let (status, item) = send(&app, request("POST", "/items", Some(&alice_token), Some(drill()))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["userId"], alice_id.as_str());
    let item_uri = format!("/items/{}", item["id"].as_str().unwrap_or_default());

    let (_, bob_token) = register(&app, "bob", "pw3").await?;
    let mut changed = drill();
    changed["title"] = json!("Stolen drill");
    let (status, body) = send(&app, request("PUT", &item_uri, Some(&bob_token), Some(changed))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(send(&app, request("DELETE", &item_uri, Some(&bob_token), None)?).await?.0, StatusCode::FORBIDDEN);

    let (status, view) = send(&app, request("GET", &item_uri, None, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["item"], item);
    assert_eq!(view["ownerName"], "alice");

    assert_eq!(send(&app, request("DELETE", &item_uri, Some(&alice_token), None)?).await?.0, StatusCode::NO_CONTENT);
    assert_eq!(send(&app, request("GET", &item_uri, None, None)?).await?.0, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn owner_can_update() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (_, token) = register(&app, "alice", "pw1").await?;
    let (_, item) = send(&app, request("POST", "/items", Some(&token), Some(drill()))?).await?;
    let item_uri = format!("/items/{}", item["id"].as_str().unwrap_or_default());

    let mut changed = drill();
    changed["title"] = json!("Hammer drill");
    changed["description"] = json!("bits included");
    let (status, updated) = send(&app, request("PUT", &item_uri, Some(&token), Some(changed))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Hammer drill");
    assert_eq!(updated["description"], "bits included");
    assert_eq!(updated["id"], item["id"]);
    assert_eq!(updated["createdAt"], item["createdAt"]);
    Ok(())
}

#[tokio::test]
async fn mutations_require_a_session() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, request("POST", "/items", None, Some(drill()))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2001);

    let uri = format!("/items/{}", uuid::Uuid::new_v4());
    assert_eq!(send(&app, request("PUT", &uri, None, Some(drill()))?).await?.0, StatusCode::UNAUTHORIZED);
    assert_eq!(send(&app, request("DELETE", &uri, None, None)?).await?.0, StatusCode::UNAUTHORIZED);
    assert_eq!(send(&app, request("GET", "/items/mine", None, None)?).await?.0, StatusCode::UNAUTHORIZED);
    assert_eq!(send(&app, request("GET", "/auth/me", None, None)?).await?.0, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_named() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (_, token) = register(&app, "alice", "pw1").await?;
    let payload = json!({"title": "", "phoneNumber": "555", "address": "  "});
    let (status, body) = send(&app, request("POST", "/items", Some(&token), Some(payload))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"], json!(["title", "address", "imageUrl"]));
    Ok(())
}

#[tokio::test]
async fn listings_filter_by_owner() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (alice_id, alice) = register(&app, "alice", "pw1").await?;
    let (_, bob) = register(&app, "bob", "pw2").await?;

    for (token, title) in [(&alice, "Drill"), (&bob, "Kayak"), (&alice, "Ladder")] {
        let mut payload = drill();
        payload["title"] = json!(title);
        assert_eq!(send(&app, request("POST", "/items", Some(token), Some(payload))?).await?.0, StatusCode::CREATED);
    }

    let (_, all) = send(&app, request("GET", "/items", None, None)?).await?;
    let titles: Vec<&str> = all.as_array().into_iter().flatten().filter_map(|i| i["title"].as_str()).collect();
    assert_eq!(titles, ["Drill", "Kayak", "Ladder"]);

    let (status, mine) = send(&app, request("GET", "/items/mine", Some(&alice), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    let mine_titles: Vec<&str> = mine.as_array().into_iter().flatten().filter_map(|i| i["title"].as_str()).collect();
    assert_eq!(mine_titles, ["Drill", "Ladder"]);

    let (_, by_user) = send(&app, request("GET", &format!("/users/{alice_id}/items"), None, None)?).await?;
    assert_eq!(by_user, mine);
    Ok(())
}

#[tokio::test]
async fn token_and_cookie_resolve_the_caller() -> anyhow::Result<()> {
    let app = build_app().await?;
    let req = request("POST", "/auth/register", None, Some(json!({"name": "alice", "password": "pw1"})))?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("auth_token="), "{cookie}");
    assert!(cookie.contains("HttpOnly"));
    let pair = cookie.split(';').next().unwrap_or_default().to_string();

    let req = Request::builder().method("GET").uri("/auth/me").header(header::COOKIE, pair).body(Body::empty())?;
    let (status, me) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "alice");
    Ok(())
}

#[tokio::test]
async fn bad_tokens_are_rejected() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, _) = send(&app, request("GET", "/items", Some("not-a-token"), None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("GET")
        .uri("/items")
        .header(header::AUTHORIZATION, "Basic abc")
        .body(Body::empty())?;
    assert_eq!(send(&app, req).await?.0, StatusCode::UNAUTHORIZED);

    // a stale token does not block logging in
    register(&app, "alice", "pw1").await?;
    let req = request("POST", "/auth/login", Some("stale"), Some(json!({"name": "alice", "password": "pw1"})))?;
    assert_eq!(send(&app, req).await?.0, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_clears_cookie_and_is_repeatable() -> anyhow::Result<()> {
    let app = build_app().await?;
    register(&app, "alice", "pw1").await?;
    for _ in 0..2 {
        let resp = app.clone().oneshot(request("POST", "/auth/logout", None, None)?).await?;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let cookie = resp.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
        assert!(cookie.starts_with("auth_token="), "{cookie}");
    }
    Ok(())
}

#[tokio::test]
async fn unknown_item_is_not_found() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, request("GET", &format!("/items/{}", uuid::Uuid::new_v4()), None, None)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_bearer_token() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (_, token) = register(&app, "alice", "pw1").await?;
    assert_eq!(send(&app, request("GET", "/auth/me", Some(&token), None)?).await?.0, StatusCode::OK);

    assert_eq!(send(&app, request("POST", "/auth/logout", Some(&token), None)?).await?.0, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, request("GET", "/auth/me", Some(&token), None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
    assert_eq!(send(&app, request("POST", "/items", Some(&token), Some(drill()))?).await?.0, StatusCode::UNAUTHORIZED);

    // a fresh login gets a working token
    let req = request("POST", "/auth/login", None, Some(json!({"name": "alice", "password": "pw1"})))?;
    let (_, body) = send(&app, req).await?;
    let fresh = body["token"].as_str().unwrap_or_default();
    let (status, me) = send(&app, request("GET", "/auth/me", Some(fresh), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "alice");
    Ok(())
}

#[tokio::test]
async fn stale_cookie_browses_anonymously() -> anyhow::Result<()> {
    let app = build_app().await?;
    let with_cookie = |method: &str, uri: &str, body: Option<Value>| -> anyhow::Result<Request<Body>> {
        let mut req = request(method, uri, None, body)?;
        req.headers_mut().insert(header::COOKIE, "auth_token=expired.or.garbage".parse()?);
        Ok(req)
    };

    let resp = app.clone().oneshot(with_cookie("GET", "/items", None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = resp.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(cleared.starts_with("auth_token=;"), "{cleared}");
    assert!(cleared.contains("Max-Age=0"), "{cleared}");

    let uri = format!("/users/{}/items", uuid::Uuid::new_v4());
    assert_eq!(send(&app, with_cookie("GET", &uri, None)?).await?.0, StatusCode::OK);

    let (status, body) = send(&app, with_cookie("POST", "/items", Some(drill()))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2001);
    Ok(())
}

#[tokio::test]
async fn malformed_id_gets_json_error() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, request("GET", "/items/not-a-uuid", None, None)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["code"], 3001);

    let (status, body) = send(&app, request("GET", "/users/42/items", None, None)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3001);
    Ok(())
}

#[tokio::test]
async fn oversized_body_gets_json_error() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (_, token) = register(&app, "alice", "pw1").await?;
    let mut payload = drill();
    payload["imageUrl"] = json!(format!("data:image/png;base64,{}", "A".repeat(IMAGE_LIMIT + 128 * 1024)));

    let (status, body) = send(&app, request("POST", "/items", Some(&token), Some(payload))?).await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], 3002);
    Ok(())
}

#[tokio::test]
async fn malformed_json_gets_json_error() -> anyhow::Result<()> {
    let app = build_app().await?;
    let req = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3002);
    Ok(())
}
