//! HTTP-layer tests through the real route table.
//!
//! Tests that never reach Postgres run against a lazily connected pool
//! and need no infrastructure. Full request flows against a live
//! database live behind `#[ignore]`.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use auth_api::config::Config;
use auth_api::security::TokenSigner;
use auth_api::services::{SecondFactorManager, SessionManager};
use auth_api::{db, routes, AppState};

fn state_with_pool(pool: PgPool) -> AppState {
    let signer = TokenSigner::new("test-access-secret", "test-refresh-secret", 900, 3600);
    let second_factor = SecondFactorManager::new(pool.clone(), "auth-api-test".to_string());
    let sessions = Arc::new(SessionManager::new(
        pool.clone(),
        signer,
        second_factor,
        Duration::from_secs(180),
    ));
    AppState { db: pool, sessions }
}

/// State whose pool never connects. Good enough for handlers that fail
/// before touching the database.
fn offline_state() -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/never_connected")
        .unwrap();
    state_with_pool(pool)
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(routes::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn index_banner() {
    let app = test_app!(offline_state());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    assert_eq!(body, "REST API Authentication and Authorization");
}

#[actix_web::test]
async fn health_endpoint() {
    let app = test_app!(offline_state());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "OK");
}

#[actix_web::test]
async fn register_with_missing_fields_is_unprocessable() {
    let app = test_app!(offline_state());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "name": "Alice" }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ValidationFailed");
    assert_eq!(body["message"], "Please fill in all fields");
}

#[actix_web::test]
async fn register_rejects_unknown_role() {
    let app = test_app!(offline_state());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "name": "Alice",
                "email": "alice@example.com",
                "password": "pw1",
                "role": "superuser"
            }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn login_with_missing_fields_is_unprocessable() {
    let app = test_app!(offline_state());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "alice@example.com" }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn two_factor_login_requires_both_fields() {
    let app = test_app!(offline_state());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login/2fa")
            .set_json(json!({ "tempToken": "abc" }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Please fill in all fields (tempToken, totp)");
}

#[actix_web::test]
async fn refresh_requires_token_field() {
    let app = test_app!(offline_state());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/refresh-token")
            .set_json(json!({}))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn protected_routes_without_token_are_unauthorized() {
    let app = test_app!(offline_state());

    for (method, uri) in [
        ("GET", "/api/users/current"),
        ("GET", "/api/auth/2fa/generate"),
        ("POST", "/api/auth/logout"),
        ("GET", "/api/admin"),
        ("GET", "/api/admin/moderator"),
    ] {
        let req = match method {
            "GET" => test::TestRequest::get(),
            _ => test::TestRequest::post(),
        }
        .uri(uri)
        .to_request();

        let resp = test::try_call_service(&app, req).await;
        let err = resp.expect_err("request without token must fail");
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

async fn live_state() -> AppState {
    let config = Config::from_env().expect("env config for ignored tests");
    let pool = db::create_pool(&config.database_url, 5).await.expect("connect");
    db::run_migrations(&pool).await.expect("migrate");
    state_with_pool(pool)
}

#[actix_web::test]
#[ignore]
async fn register_login_refresh_logout_over_http() {
    let app = test_app!(live_state().await);
    let email = format!("user-{}@example.com", uuid::Uuid::new_v4());

    // Register.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "name": "Alice", "email": email, "password": "pw1" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User registered successfully");

    // Duplicate registration conflicts.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "name": "Alice", "email": email, "password": "pw1" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Login returns a camelCase token pair.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": "pw1" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let access = body["accessToken"].as_str().unwrap().to_string();
    let refresh = body["refreshToken"].as_str().unwrap().to_string();

    // The access token opens protected routes.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/users/current")
            .insert_header(("Authorization", format!("Bearer {access}")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], email);
    assert_eq!(body["role"], "member");

    // Rotate the refresh token; the old one dies.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/refresh-token")
            .set_json(json!({ "refreshToken": refresh }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/refresh-token")
            .set_json(json!({ "refreshToken": refresh }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "RefreshTokenInvalid");

    // Logout, then the access token is revoked.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/logout")
            .insert_header(("Authorization", format!("Bearer {access}")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let err = test::try_call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/users/current")
            .insert_header(("Authorization", format!("Bearer {access}")))
            .to_request(),
    )
    .await
    .expect_err("revoked token must fail");
    let resp = err.error_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[ignore]
async fn role_gated_routes() {
    let app = test_app!(live_state().await);
    let email = format!("mod-{}@example.com", uuid::Uuid::new_v4());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "name": "Mod",
                "email": email,
                "password": "pw1",
                "role": "moderator"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": "pw1" }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let access = body["accessToken"].as_str().unwrap().to_string();

    // Moderators pass the shared gate but not the admin-only one.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/admin/moderator")
            .insert_header(("Authorization", format!("Bearer {access}")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/admin")
            .insert_header(("Authorization", format!("Bearer {access}")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
