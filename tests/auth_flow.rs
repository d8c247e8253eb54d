//! Integration tests for token acquisition using wiremock.
//!
//! The mock server plays both the OAuth token endpoint and the resource API
//! so the whole path can be checked end to end:
//!
//! - POST /api/v1/oauth/token/ : password grant
//! - any  /resource-api/...    : resource calls carrying the bearer token

use std::time::Duration;

use fortisase::client::FortiSaseClient;
use fortisase::config::{ClientConfig, RetryPolicy};
use fortisase::credentials::Credentials;
use fortisase::error::FortiSaseError;
use fortisase::request::OperationRequest;
use reqwest::Method;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/api/v1/oauth/token/";

/// Helper: config pointing both endpoints at the mock server.
fn mock_config(server: &MockServer) -> ClientConfig {
    ClientConfig::default()
        .with_api_base_url(&server.uri())
        .with_token_url(&format!("{}{TOKEN_PATH}", server.uri()))
        .with_retry(RetryPolicy {
            transport_attempts: 2,
            transport_delay: Duration::from_millis(10),
            backoff: Duration::from_millis(10),
            ..RetryPolicy::default()
        })
}

fn mock_client(server: &MockServer, credentials: Credentials) -> FortiSaseClient {
    FortiSaseClient::with_config(credentials, mock_config(server)).unwrap()
}

// ── password grant ─────────────────────────────────────────────────────

#[tokio::test]
async fn token_exchange_stores_tokens_and_authorizes_requests() {
    let server = MockServer::start().await;
    let client = mock_client(&server, Credentials::new("api-user", "s3cret"));

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "username": "api-user",
            "password": "s3cret",
            "client_id": "FortiSASE",
            "grant_type": "password"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "T",
            "refresh_token": "R",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/resource-api/v1/network/host-groups"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 200,
            "data": {"primaryKey": "office"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = OperationRequest::new(Method::POST, "/resource-api/v1/network/host-groups")
        .body(serde_json::json!({"primaryKey": "office"}));
    let created = client.create_update(&op).await.unwrap();
    assert_eq!(created, serde_json::json!({"primaryKey": "office"}));

    let creds = client.credentials().await;
    assert_eq!(creds.access_token, "T");
    assert_eq!(creds.refresh_token, "R");
}

#[tokio::test]
async fn token_is_reused_across_operations() {
    let server = MockServer::start().await;
    let client = mock_client(&server, Credentials::new("api-user", "s3cret"));

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "T",
            "refresh_token": "R"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/resource-api/v1/security/antivirus-profiles"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 200,
            "data": []
        })))
        .expect(3)
        .mount(&server)
        .await;

    let op = OperationRequest::new(Method::GET, "/resource-api/v1/security/antivirus-profiles");
    for _ in 0..3 {
        assert!(client.read(&op).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn rejected_grant_surfaces_status_message() {
    let server = MockServer::start().await;
    let client = mock_client(&server, Credentials::new("api-user", "wrong"));

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "status": "error",
            "status_message": "Invalid username or password"
        })))
        .mount(&server)
        .await;

    // The resource endpoint must never be reached without a token.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let op = OperationRequest::new(Method::GET, "/resource-api/v1/anything");
    let err = client.read(&op).await.unwrap_err();
    match err {
        FortiSaseError::Authentication { message } => {
            assert_eq!(message, "Invalid username or password");
        }
        other => panic!("expected Authentication, got {other:?}"),
    }
    assert!(client.credentials().await.access_token.is_empty());
}

#[tokio::test]
async fn empty_token_response_is_reported() {
    let server = MockServer::start().await;
    let client = mock_client(&server, Credentials::new("api-user", "s3cret"));

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let op =
        OperationRequest::new(Method::DELETE, "/resource-api/v1/anything/{k}").primary_key("x");
    let err = client.delete(&op).await.unwrap_err();
    assert!(
        matches!(err, FortiSaseError::EmptyResponse { ref url } if url.ends_with(TOKEN_PATH)),
        "expected EmptyResponse from token endpoint, got {err:?}"
    );
}

#[tokio::test]
async fn non_json_token_response_is_a_parse_error() {
    let server = MockServer::start().await;
    let client = mock_client(&server, Credentials::new("api-user", "s3cret"));

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let op = OperationRequest::new(Method::GET, "/resource-api/v1/anything");
    let err = client.read(&op).await.unwrap_err();
    assert!(matches!(err, FortiSaseError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn empty_access_token_is_a_rejected_grant() {
    let server = MockServer::start().await;
    let client = mock_client(&server, Credentials::new("api-user", "s3cret"));

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "",
            "status_message": "account locked"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = OperationRequest::new(Method::GET, "/resource-api/v1/anything");
    let err = client.read(&op).await.unwrap_err();
    match err {
        FortiSaseError::Authentication { message } => assert_eq!(message, "account locked"),
        other => panic!("expected Authentication, got {other:?}"),
    }
    assert!(client.credentials().await.access_token.is_empty());
}

#[tokio::test]
async fn tls_failure_on_token_endpoint_is_not_retried() {
    let server = MockServer::start().await;
    let https_token_url = format!(
        "{}{TOKEN_PATH}",
        server.uri().replacen("http://", "https://", 1)
    );
    let config = mock_config(&server)
        .with_token_url(&https_token_url)
        .with_retry(RetryPolicy {
            transport_attempts: 5,
            transport_delay: Duration::from_millis(300),
            ..RetryPolicy::default()
        });
    let client = FortiSaseClient::with_config(Credentials::new("api-user", "s3cret"), config)
        .unwrap();

    let op = OperationRequest::new(Method::GET, "/resource-api/v1/anything");
    let started = std::time::Instant::now();
    let err = client.read(&op).await.unwrap_err();

    match err {
        FortiSaseError::Connection { ref url, .. } => assert_eq!(url, &https_token_url),
        other => panic!("expected Connection, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_millis(300));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── pre-issued tokens ──────────────────────────────────────────────────

#[tokio::test]
async fn preset_access_token_skips_grant() {
    let server = MockServer::start().await;
    let client = mock_client(&server, Credentials::with_tokens("preset", ""));

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/resource-api/v1/auth/users/alice"))
        .and(header("authorization", "Bearer preset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 200,
            "data": {"name": "alice"}
        })))
        .mount(&server)
        .await;

    let op = OperationRequest::new(Method::GET, "/resource-api/v1/auth/users/{primaryKey}")
        .primary_key("alice");
    let user = client.read(&op).await.unwrap();
    assert_eq!(user, Some(serde_json::json!({"name": "alice"})));
}

#[tokio::test]
async fn refresh_token_only_reports_missing_access_token() {
    let server = MockServer::start().await;
    let client = mock_client(&server, Credentials::with_tokens("", "R"));

    // Neither a grant nor a resource call may happen.
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let op = OperationRequest::new(Method::GET, "/resource-api/v1/anything");
    let err = client.read(&op).await.unwrap_err();
    assert!(matches!(err, FortiSaseError::Authentication { .. }), "got {err:?}");
    assert_eq!(client.credentials().await.refresh_token, "R");
}

// ── single flight ──────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_first_use_issues_one_grant() {
    let server = MockServer::start().await;
    let client = mock_client(&server, Credentials::new("api-user", "s3cret"));

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "access_token": "T",
                    "refresh_token": "R"
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 200,
            "data": {"ok": true}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let first = OperationRequest::new(Method::GET, "/resource-api/v1/a");
    let second = OperationRequest::new(Method::GET, "/resource-api/v1/b");
    let (a, b) = tokio::join!(client.read(&first), client.read(&second));
    assert!(a.unwrap().is_some());
    assert!(b.unwrap().is_some());
}
