use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use std::path::PathBuf;
use std::sync::Arc;
use supportsync::api::AppState;
use supportsync::config::Config;
use supportsync::domain::Role;
use tower::ServiceExt;

const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Removes the sqlite file (and its WAL side files) when the test ends.
struct TempDb(PathBuf);

impl TempDb {
    fn new(prefix: &str) -> Self {
        Self(std::env::temp_dir().join(format!("{prefix}-{}.db", uuid::Uuid::new_v4())))
    }

    fn url(&self) -> String {
        format!("sqlite:{}", self.0.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.0.display()));
        }
    }
}

async fn spawn_app() -> (Router, Arc<AppState>, TempDb) {
    let db = TempDb::new("supportsync-api-test");

    let mut config = Config::default();
    config.general.database_path = db.url();
    config.security.token_secret = Some(TEST_SECRET.to_string());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = supportsync::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    (supportsync::api::router(state.clone()), state, db)
}

async fn seed(state: &AppState, username: &str, password: &str, role: Role) -> i32 {
    state
        .store()
        .create_account(username, password, role, &state.config().security)
        .await
        .expect("Failed to seed account")
        .id
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn login(app: &Router, username: &str, password: &str, role: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &serde_json::json!({ "username": username, "password": password, "role": role }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_login() {
    let (app, state, _db) = spawn_app().await;
    let om_id = seed(&state, "om", "hunter2", Role::User).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &serde_json::json!({ "username": "om", "password": "hunter2", "role": "user" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["accountId"], om_id);
    assert_eq!(body["role"], "user");
    assert_eq!(body["username"], "om");
    assert!(body["expiresAt"].is_string());

    // Legacy field name for the role
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &serde_json::json!({ "username": "om", "password": "hunter2", "userType": "user" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let (app, state, _db) = spawn_app().await;
    seed(&state, "om", "hunter2", Role::User).await;

    let attempts = [
        serde_json::json!({ "username": "om", "password": "wrong", "role": "user" }),
        serde_json::json!({ "username": "nobody", "password": "hunter2", "role": "user" }),
        serde_json::json!({ "username": "om", "password": "hunter2", "role": "admin" }),
        serde_json::json!({ "username": "om", "password": "hunter2", "role": "superuser" }),
    ];

    for attempt in attempts {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/auth/login", &attempt))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{attempt}");
        assert_eq!(body_json(response).await["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_malformed_login_body_is_bad_request() {
    let (app, _, _db) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"username\": \"om\""))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_access_guard() {
    let (app, state, _db) = spawn_app().await;
    let om_id = seed(&state, "om", "hunter2", Role::User).await;
    let uri = format!("/api/tickets/user/{om_id}");

    let response = app
        .clone()
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::AUTHORIZATION, "Basic b206aHVudGVyMg==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let token = login(&app, "om", "hunter2", "user").await;
    let (payload, signature) = token.split_once('.').unwrap();
    let tampered = format!("{payload}x.{signature}");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::AUTHORIZATION, format!("Bearer {tampered}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _, _db) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_metrics_requires_admin() {
    let (app, state, _db) = spawn_app().await;
    seed(&state, "om", "hunter2", Role::User).await;
    seed(&state, "root", "s3cret", Role::Admin).await;

    let user_token = login(&app, "om", "hunter2", "user").await;
    let admin_token = login(&app, "root", "s3cret", "admin").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/metrics")
                .header(header::AUTHORIZATION, format!("Bearer {user_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/metrics")
                .header(header::AUTHORIZATION, format!("Bearer {admin_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_profile_endpoints() {
    let (app, state, _db) = spawn_app().await;
    let om_id = seed(&state, "om", "hunter2", Role::User).await;
    let raj_id = seed(&state, "raj", "pa55", Role::User).await;
    seed(&state, "root", "s3cret", Role::Admin).await;

    let om_token = login(&app, "om", "hunter2", "user").await;
    let raj_token = login(&app, "raj", "pa55", "user").await;
    let admin_token = login(&app, "root", "s3cret", "admin").await;

    let mut update = json_request(
        "PUT",
        &format!("/api/users/profile/{om_id}"),
        &serde_json::json!({ "email": "om@example.com", "department": "Finance" }),
    );
    update.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {om_token}").parse().unwrap(),
    );
    let response = app.clone().oneshot(update).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["message"].is_string());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/users/profile/{om_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {admin_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "om");
    assert_eq!(body["email"], "om@example.com");
    assert_eq!(body["department"], "Finance");
    assert!(body["phone"].is_null());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/users/profile/{om_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {raj_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut bad_email = json_request(
        "PUT",
        &format!("/api/users/profile/{raj_id}"),
        &serde_json::json!({ "email": "raj-at-example" }),
    );
    bad_email.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {raj_token}").parse().unwrap(),
    );
    let response = app.clone().oneshot(bad_email).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/profile/9999")
                .header(header::AUTHORIZATION, format!("Bearer {admin_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let (app, _, _db) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/nothing-here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
}
