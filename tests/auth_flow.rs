//! End-to-end tests for the `/api/auth` routes.
//!
//! Runs against `MemoryUserStore`, so no database is needed.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use session_auth::{create_routes, AuthConfig, AuthService, MemoryUserStore, TokenPair};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

fn test_config() -> AuthConfig {
    AuthConfig {
        access_token_secret: "access_secret_for_testing_only_0123".to_string(),
        access_token_expiration: 900,
        refresh_token_secret: "refresh_secret_for_testing_only_0123".to_string(),
        refresh_token_expiration: 1_296_000,
        cookie_max_age: 1_296_000,
        argon2_memory_cost: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        min_password_length: 6,
    }
}

fn create_test_app() -> Router {
    let auth = AuthService::new(Arc::new(MemoryUserStore::new()), test_config())
        .expect("valid test config");
    create_routes(Arc::new(auth))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_with_cookie(uri: &str, refresh_token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, format!("refresh_token={}", refresh_token))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn set_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

async fn signup_alice(app: &Router) -> TokenPair {
    let response = send(
        app,
        post_json(
            "/api/auth/signup",
            json!({"name": "Alice", "email": "alice@example.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    serde_json::from_value(body_json(response).await).unwrap()
}

async fn current_user_id(app: &Router, access_token: &str) -> i64 {
    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
        .body(Body::empty())
        .unwrap();

    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["user"]["id"].as_i64().unwrap()
}

// ============================================================================
// Signup / Signin
// ============================================================================

#[tokio::test]
async fn test_signup_sets_refresh_cookie() {
    let app = create_test_app();

    let response = send(
        &app,
        post_json(
            "/api/auth/signup",
            json!({"name": "Alice", "email": "alice@example.com", "password": "secret123"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = set_cookie(&response);
    let tokens: TokenPair = serde_json::from_value(body_json(response).await).unwrap();

    assert!(cookie.starts_with(&format!("refresh_token={};", tokens.refresh_token)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=1296000"));
    assert!(!tokens.access_token.is_empty());
}

#[tokio::test]
async fn test_signup_duplicate_email_conflict() {
    let app = create_test_app();
    signup_alice(&app).await;

    let response = send(
        &app,
        post_json(
            "/api/auth/signup",
            json!({"name": "Other", "email": "alice@example.com", "password": "another1"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "email_exists");
}

#[tokio::test]
async fn test_signup_rejects_invalid_email() {
    let app = create_test_app();

    let response = send(
        &app,
        post_json(
            "/api/auth/signup",
            json!({"name": "Alice", "email": "alice", "password": "secret123"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signin_subject_matches_signup_user() {
    let app = create_test_app();
    let signup = signup_alice(&app).await;
    let user_id = current_user_id(&app, &signup.access_token).await;

    let response = send(
        &app,
        post_json(
            "/api/auth/signin",
            json!({"email": "alice@example.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).starts_with("refresh_token="));

    let tokens: TokenPair = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(current_user_id(&app, &tokens.access_token).await, user_id);
}

#[tokio::test]
async fn test_signin_failures() {
    let app = create_test_app();
    signup_alice(&app).await;

    let wrong_password = send(
        &app,
        post_json(
            "/api/auth/signin",
            json!({"email": "alice@example.com", "password": "wrong-password"}),
        ),
    )
    .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);

    let unknown = send(
        &app,
        post_json(
            "/api/auth/signin",
            json!({"email": "bob@example.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_rotation_and_replay() {
    let app = create_test_app();
    let original = signup_alice(&app).await;
    let user_id = current_user_id(&app, &original.access_token).await;
    let uri = format!("/api/auth/refresh/{}", user_id);

    let response = send(&app, post_with_cookie(&uri, &original.refresh_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);

    let body = body_json(response).await;
    let rotated: TokenPair = serde_json::from_value(body["tokens"].clone()).unwrap();
    assert_ne!(rotated.refresh_token, original.refresh_token);
    assert!(cookie.starts_with(&format!("refresh_token={};", rotated.refresh_token)));
    assert_eq!(body["user"]["id"].as_i64(), Some(user_id));
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("hashed_refresh_token").is_none());

    // Replaying the original token is refused
    let replay = send(&app, post_with_cookie(&uri, &original.refresh_token)).await;
    assert_eq!(replay.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(replay).await["error"], "refresh_token_mismatch");

    // The rotated token works
    let next = send(&app, post_with_cookie(&uri, &rotated.refresh_token)).await;
    assert_eq!(next.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_wrong_user_id() {
    let app = create_test_app();
    let tokens = signup_alice(&app).await;
    let user_id = current_user_id(&app, &tokens.access_token).await;

    let uri = format!("/api/auth/refresh/{}", user_id + 1);
    let response = send(&app, post_with_cookie(&uri, &tokens.refresh_token)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "subject_mismatch");
}

#[tokio::test]
async fn test_refresh_without_cookie() {
    let app = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh/1")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "missing_refresh_token");
}

#[tokio::test]
async fn test_refresh_with_forged_token() {
    let app = create_test_app();
    let tokens = signup_alice(&app).await;
    let user_id = current_user_id(&app, &tokens.access_token).await;

    // Access tokens are signed with a different secret
    let uri = format!("/api/auth/refresh/{}", user_id);
    let response = send(&app, post_with_cookie(&uri, &tokens.access_token)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(set_cookie(&response).contains("Max-Age=0"));
    assert_eq!(body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_refresh_replayed_token_clears_cookie() {
    let app = create_test_app();
    let original = signup_alice(&app).await;
    let user_id = current_user_id(&app, &original.access_token).await;
    let uri = format!("/api/auth/refresh/{}", user_id);

    let first = send(&app, post_with_cookie(&uri, &original.refresh_token)).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert!(!set_cookie(&first).contains("Max-Age=0"));

    let replay = send(&app, post_with_cookie(&uri, &original.refresh_token)).await;
    assert_eq!(replay.status(), StatusCode::FORBIDDEN);
    assert_eq!(set_cookie(&replay), "refresh_token=; Max-Age=0; Path=/; HttpOnly");
}

#[tokio::test]
async fn test_refresh_non_numeric_id() {
    let app = create_test_app();
    let tokens = signup_alice(&app).await;

    let response = send(
        &app,
        post_with_cookie("/api/auth/refresh/abc", &tokens.refresh_token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "User id must be an integer");
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_clears_session() {
    let app = create_test_app();
    let tokens = signup_alice(&app).await;
    let user_id = current_user_id(&app, &tokens.access_token).await;

    let response = send(&app, post_with_cookie("/api/auth/logout", &tokens.refresh_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).contains("Max-Age=0"));
    assert_eq!(body_json(response).await["message"], "Logged out successfully");

    let uri = format!("/api/auth/refresh/{}", user_id);
    let refresh = send(&app, post_with_cookie(&uri, &tokens.refresh_token)).await;
    assert_eq!(refresh.status(), StatusCode::BAD_REQUEST);
    // A dead session also drops the stale cookie
    assert!(set_cookie(&refresh).starts_with("refresh_token=; Max-Age=0"));
    assert_eq!(body_json(refresh).await["error"], "no_active_session");
}

#[tokio::test]
async fn test_logout_invalid_token() {
    let app = create_test_app();

    let response = send(&app, post_with_cookie("/api/auth/logout", "not-a-token")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(set_cookie(&response).contains("Max-Age=0"));

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Access Token
// ============================================================================

#[tokio::test]
async fn test_me_requires_access_token() {
    let app = create_test_app();
    let tokens = signup_alice(&app).await;

    let missing = Request::builder()
        .uri("/api/auth/me")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, missing).await.status(), StatusCode::UNAUTHORIZED);

    // Refresh tokens are not accepted as access tokens
    let wrong_kind = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", tokens.refresh_token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong_kind).await.status(), StatusCode::UNAUTHORIZED);
}
