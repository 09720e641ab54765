//! Router tests that run without a database
//!
//! The pool is created lazily, so any request that reaches a query would fail;
//! these only exercise routing, authentication and authorization.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use library_ledger::{
    api, config::AppConfig, models::user::UserClaims, repository::Repository, services::Services,
    AppState,
};

fn app() -> (Router, AppConfig) {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .unwrap();
    let services = Services::new(Repository::new(pool.clone()), &config);
    let state = AppState {
        config: Arc::new(config.clone()),
        services: Arc::new(services),
        pool,
    };
    (api::create_router(state), config)
}

fn token(config: &AppConfig, is_admin: bool) -> String {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: "reader".to_string(),
        user_id: 42,
        is_admin,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&config.auth.jwt_secret)
    .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_loans_require_a_token() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/api/v1/loans").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], 2);
}

#[tokio::test]
async fn test_token_signed_with_another_secret_is_rejected() {
    let (app, config) = app();
    let mut other = config.clone();
    other.auth.jwt_secret = "not-the-server-secret".to_string();

    let response = app
        .oneshot(
            Request::post("/api/v1/loans/1/return")
                .header(AUTHORIZATION, format!("Bearer {}", token(&other, false)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_members_cannot_reach_admin_routes() {
    let (app, config) = app();
    let member = token(&config, false);

    for (method, uri) in [
        ("GET", "/api/v1/admin/overview"),
        ("GET", "/api/v1/admin/users"),
        ("GET", "/api/v1/admin/loans"),
        ("POST", "/api/v1/admin/loans/1/return"),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(AUTHORIZATION, format!("Bearer {}", member))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_members_cannot_add_books() {
    let (app, config) = app();

    let response = app
        .oneshot(
            Request::post("/api/v1/books")
                .header(AUTHORIZATION, format!("Bearer {}", token(&config, false)))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title":"Dune","author":"Frank Herbert","copies":2}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_huge_page_number_is_a_bad_request() {
    let (app, config) = app();
    let member = token(&config, false);
    let admin = token(&config, true);

    for (uri, bearer) in [
        ("/api/v1/books?page=9223372036854775807", &member),
        ("/api/v1/admin/users?page=9223372036854775807&per_page=200", &admin),
        ("/api/v1/admin/loans?page=9223372036854775807", &admin),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::get(uri)
                    .header(AUTHORIZATION, format!("Bearer {}", bearer))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(json_body(response).await["code"], 18);
    }
}
