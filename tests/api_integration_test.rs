//! REST API integration tests.
//!
//! These run the full router in-process over the in-memory stores; no
//! database is required.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use common::*;

// ============================================================================
// Test Helpers
// ============================================================================

async fn send_request(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let body = body
        .map(|v| Body::from(serde_json::to_vec(&v).unwrap()))
        .unwrap_or_else(|| Body::from(Vec::new()));

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();

    let json = if bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&bytes) }))
    };

    (status, json)
}

fn error_code(body: &serde_json::Value) -> &str {
    body["error"]["code"].as_str().unwrap_or("")
}

async fn open_voting(app: &TestApp) {
    use bookvote::domain::StatusUpdate;
    use bookvote::infra::StatusStore;
    app.status
        .set_status(StatusUpdate::default().with_active(true))
        .await
        .unwrap();
}

// ============================================================================
// Service probes
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_healthy() {
    let app = TestApp::new();

    let (status, body) = send_request(&app.router, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "bookvote");
}

#[tokio::test]
async fn test_readiness_without_pool_reports_not_configured() {
    let app = TestApp::new();

    let (status, body) = send_request(&app.router, Method::GET, "/ready", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "not configured");
}

// ============================================================================
// Registration and login
// ============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new();

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/register",
        Some(json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": TEST_PASSWORD,
            "confirm_password": TEST_PASSWORD,
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["is_admin"], false);

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/login",
        Some(json!({ "username": "ada", "password": TEST_PASSWORD })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_admin"], false);
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_registration_never_grants_admin() {
    let app = TestApp::new();

    // The request body has no admin field to smuggle; registration always
    // creates a plain account.
    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/register",
        Some(json!({
            "username": "mallory",
            "email": "mallory@example.com",
            "password": TEST_PASSWORD,
            "confirm_password": TEST_PASSWORD,
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_admin"], false);
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let app = TestApp::new();

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/register",
        Some(json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "one password",
            "confirm_password": "another password",
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_rejects_malformed_email() {
    let app = TestApp::new();

    for email in ["not-an-email", "@example.com", "ada@nodot"] {
        let (status, body) = send_request(
            &app.router,
            Method::POST,
            "/register",
            Some(json!({
                "username": "ada",
                "email": email,
                "password": TEST_PASSWORD,
                "confirm_password": TEST_PASSWORD,
            })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "email: {email}");
        assert_eq!(error_code(&body), "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let app = TestApp::new();
    app.seed_user("ada", false).await;

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/register",
        Some(json!({
            "username": "ada",
            "email": "other@example.com",
            "password": TEST_PASSWORD,
            "confirm_password": TEST_PASSWORD,
        })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "DUPLICATE_USER");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.seed_user("ada", false).await;

    // Unknown user and wrong password produce the same error.
    let (unknown_status, unknown_body) = send_request(
        &app.router,
        Method::POST,
        "/login",
        Some(json!({ "username": "nobody", "password": TEST_PASSWORD })),
        None,
    )
    .await;
    let (wrong_status, wrong_body) = send_request(
        &app.router,
        Method::POST,
        "/login",
        Some(json!({ "username": "ada", "password": "wrong password" })),
        None,
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&unknown_body), "INVALID_CREDENTIALS");
    assert_eq!(error_code(&unknown_body), error_code(&wrong_body));
}

#[tokio::test]
async fn test_refresh_issues_a_working_pair() {
    let app = TestApp::new();
    let user = app.seed_user("ada", false).await;
    let refresh_token = app.tokens.issue_pair(&user).unwrap().refresh_token;

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/refresh",
        Some(json!({ "refresh_token": refresh_token })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) =
        send_request(&app.router, Method::GET, "/voting-status", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_token_cannot_authorize_api_calls() {
    let app = TestApp::new();
    let user = app.seed_user("ada", false).await;
    let refresh_token = app.tokens.issue_pair(&user).unwrap().refresh_token;

    let (status, body) = send_request(
        &app.router,
        Method::GET,
        "/voting-status",
        None,
        Some(&refresh_token),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHORIZED");
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_protected_endpoints_require_a_token() {
    let app = TestApp::new();

    for (method, uri) in [
        (Method::GET, "/voting-status"),
        (Method::POST, "/vote"),
        (Method::GET, "/get-votes"),
    ] {
        let (status, body) = send_request(&app.router, method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(error_code(&body), "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_status_update_requires_admin() {
    let app = TestApp::new();
    let voter = app.seed_user("ada", false).await;
    let token = app.token_for(&voter);

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/voting-status",
        Some(json!({ "is_active": true })),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");
}

// ============================================================================
// Voting status
// ============================================================================

#[tokio::test]
async fn test_initial_status_is_closed_and_hidden() {
    let app = TestApp::new();
    let voter = app.seed_user("ada", false).await;
    let token = app.token_for(&voter);

    let (status, body) =
        send_request(&app.router, Method::GET, "/voting-status", None, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);
    assert_eq!(body["display_results"], false);
}

#[tokio::test]
async fn test_partial_status_update_does_not_clobber() {
    let app = TestApp::new();
    let admin = app.seed_user("librarian", true).await;
    let token = app.token_for(&admin);

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/voting-status",
        Some(json!({ "is_active": true })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], true);
    assert_eq!(body["display_results"], false);

    // Revealing results must leave is_active untouched.
    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/voting-status",
        Some(json!({ "display_results": true })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], true);
    assert_eq!(body["display_results"], true);

    // And hiding voting must leave display_results untouched.
    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/voting-status",
        Some(json!({ "is_active": false })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);
    assert_eq!(body["display_results"], true);
}

// ============================================================================
// Votes
// ============================================================================

#[tokio::test]
async fn test_vote_rejected_while_closed() {
    let app = TestApp::new();
    let voter = app.seed_user("ada", false).await;
    let token = app.token_for(&voter);

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/vote",
        Some(json!({ "book": "1984" })),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "VOTING_CLOSED");
}

#[tokio::test]
async fn test_second_vote_is_a_conflict_and_ledger_is_unchanged() {
    let app = TestApp::new();
    open_voting(&app).await;
    let voter = app.seed_user("ada", false).await;
    let token = app.token_for(&voter);

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/vote",
        Some(json!({ "book": "1984" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["book"], "1984");

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/vote",
        Some(json!({ "book": "Brave New World" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ALREADY_VOTED");

    let (status, body) =
        send_request(&app.router, Method::GET, "/get-votes", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["votes"].as_array().unwrap().len(), 1);
    assert_eq!(body["votes"][0]["book"], "1984");
}

#[tokio::test]
async fn test_vote_for_unlisted_title_is_rejected() {
    let app = TestApp::new();
    open_voting(&app).await;
    let voter = app.seed_user("ada", false).await;
    let token = app.token_for(&voter);

    let (status, body) = send_request(
        &app.router,
        Method::POST,
        "/vote",
        Some(json!({ "book": "Fahrenheit 451" })),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "UNKNOWN_OPTION");
}

#[tokio::test]
async fn test_get_votes_reports_counts_and_percentages() {
    let app = TestApp::new();
    open_voting(&app).await;

    // Three votes for 1984, one for Brave New World.
    for (name, book) in [
        ("ada", "1984"),
        ("grace", "1984"),
        ("alan", "1984"),
        ("edsger", "Brave New World"),
    ] {
        let user = app.seed_user(name, false).await;
        let token = app.token_for(&user);
        let (status, _) = send_request(
            &app.router,
            Method::POST,
            "/vote",
            Some(json!({ "book": book })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{name}");
    }

    let reader = app.seed_user("reader", false).await;
    let token = app.token_for(&reader);
    let (status, body) =
        send_request(&app.router, Method::GET, "/get-votes", None, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["votes"].as_array().unwrap().len(), 4);

    let counts = body["vote_counts"].as_array().unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0]["book"], "1984");
    assert_eq!(counts[0]["count"], 3);
    assert_eq!(counts[0]["percentage"], 75.0);
    assert_eq!(counts[1]["book"], "Brave New World");
    assert_eq!(counts[1]["count"], 1);
    assert_eq!(counts[1]["percentage"], 25.0);
}

#[tokio::test]
async fn test_get_votes_includes_zero_count_options() {
    let app = TestApp::new();
    let voter = app.seed_user("ada", false).await;
    let token = app.token_for(&voter);

    let (status, body) =
        send_request(&app.router, Method::GET, "/get-votes", None, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["votes"].as_array().unwrap().is_empty());

    let counts = body["vote_counts"].as_array().unwrap();
    assert_eq!(counts.len(), 2);
    for entry in counts {
        assert_eq!(entry["count"], 0);
        assert_eq!(entry["percentage"], 0.0);
    }
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_get_user_by_id() {
    let app = TestApp::new();
    let user = app.seed_user("ada", false).await;
    let token = app.token_for(&user);

    let uri = format!("/users/{}", user.id);
    let (status, body) = send_request(&app.router, Method::GET, &uri, None, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_get_unknown_user_is_not_found() {
    let app = TestApp::new();
    let user = app.seed_user("ada", false).await;
    let token = app.token_for(&user);

    let uri = format!("/users/{}", uuid::Uuid::new_v4());
    let (status, body) = send_request(&app.router, Method::GET, &uri, None, Some(&token)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}
