//! API integration tests
//!
//! These run against a live server with a migrated database and the default
//! administrator account. Run with: cargo test -- --ignored

use chrono::Utc;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    login(client, "admin", "admin123").await
}

/// Register a fresh member and return their token
async fn member_token(client: &Client, prefix: &str) -> String {
    let login_name = format!("{}{}", prefix, Utc::now().timestamp_micros());
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "login": login_name,
            "password": "reader-pass",
            "firstname": "Test",
            "lastname": "Reader",
            "email": format!("{}@example.com", login_name)
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);

    login(client, &login_name, "reader-pass").await
}

/// Add a single-copy book so tests do not compete for seeded stock
async fn create_book(client: &Client, admin: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "title": format!("Test Book {}", Utc::now().timestamp_micros()),
            "author": "Integration Suite",
            "copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book id")
}

async fn post(client: &Client, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
    let response = client
        .post(format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.expect("Failed to parse response");
    (status, body)
}

async fn get(client: &Client, token: &str, path: &str) -> (StatusCode, Value) {
    let response = client
        .get(format!("{}{}", BASE_URL, path))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.expect("Failed to parse response");
    (status, body)
}

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("Decimal is serialized as a string")
        .parse()
        .expect("Invalid decimal")
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle_on_time() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let member = member_token(&client, "reader").await;
    let book_id = create_book(&client, &admin).await;

    let (status, loan) = post(&client, &member, "/loans", json!({ "book_id": book_id })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "active");
    let loan_id = loan["id"].as_i64().unwrap();

    let (_, book) = get(&client, &member, &format!("/books/{}", book_id)).await;
    assert_eq!(book["available_copies"], 0);

    let (status, returned) = post(&client, &member, &format!("/loans/{}/return", loan_id), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "returned_unpaid");
    assert_eq!(decimal(&returned["fine"]), Decimal::ZERO);

    let (_, book) = get(&client, &member, &format!("/books/{}", book_id)).await;
    assert_eq!(book["available_copies"], 1);

    // Nothing owed after an on-time return
    let (status, error) = post(&client, &member, &format!("/loans/{}/pay", loan_id), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], 23);

    let (status, error) = post(&client, &member, &format!("/loans/{}/return", loan_id), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], 22);

    let (status, fines) = get(&client, &member, "/loans/fines").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&fines["total_owed"]), Decimal::ZERO);
}

#[tokio::test]
#[ignore]
async fn test_last_copy_is_unavailable_to_others() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let first = member_token(&client, "first").await;
    let second = member_token(&client, "second").await;
    let book_id = create_book(&client, &admin).await;

    let (status, _) = post(&client, &first, "/loans", json!({ "book_id": book_id })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, error) = post(&client, &second, "/loans", json!({ "book_id": book_id })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], 7);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_of_last_copy() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let book_id = create_book(&client, &admin).await;

    let mut tokens = Vec::new();
    for i in 0..4 {
        tokens.push(member_token(&client, &format!("race{}_", i)).await);
    }

    let attempts = tokens.iter().map(|token| {
        let client = client.clone();
        let token = token.clone();
        tokio::spawn(async move { post(&client, &token, "/loans", json!({ "book_id": book_id })).await.0 })
    });

    let mut created = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        if attempt.await.unwrap() == StatusCode::CREATED {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let (_, book) = get(&client, &admin, &format!("/books/{}", book_id)).await;
    assert_eq!(book["available_copies"], 0);
}

#[tokio::test]
#[ignore]
async fn test_cannot_return_someone_elses_loan() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let owner = member_token(&client, "owner").await;
    let intruder = member_token(&client, "intruder").await;
    let book_id = create_book(&client, &admin).await;

    let (_, loan) = post(&client, &owner, "/loans", json!({ "book_id": book_id })).await;
    let loan_id = loan["id"].as_i64().unwrap();

    let (status, _) = post(&client, &intruder, &format!("/loans/{}/return", loan_id), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Still out on loan
    let (_, book) = get(&client, &owner, &format!("/books/{}", book_id)).await;
    assert_eq!(book["available_copies"], 0);

    let (status, returned) = post(&client, &admin, &format!("/admin/loans/{}/return", loan_id), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "returned_unpaid");
}

#[tokio::test]
#[ignore]
async fn test_admin_endpoints_require_admin() {
    let client = Client::new();
    let member = member_token(&client, "plain").await;
    let admin = admin_token(&client).await;

    let (status, _) = get(&client, &member, "/admin/overview").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, overview) = get(&client, &admin, "/admin/overview").await;
    assert_eq!(status, StatusCode::OK);
    assert!(overview["books"]["titles"].as_i64().unwrap() > 0);
    assert!(overview["loans"]["outstanding_fines"].is_string());
}
