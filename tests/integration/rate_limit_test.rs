//! Integration tests for per-endpoint fixed-window rate limiting.

mod helpers;

use axum::http::StatusCode;
use axum::http::header::RETRY_AFTER;

use authhub_core::config::WindowLimit;
use authhub_database::store::AuditStore;

use helpers::{AUDIENCE, TestApp, test_config};

/// Address of the reverse proxy the forwarded requests arrive from.
const PROXY_IP: &str = "10.0.0.1";

async fn limited_app() -> TestApp {
    let mut config = test_config();
    config.rate_limit.login = WindowLimit::new(2, 60);
    config.rate_limit.forgot_password = WindowLimit::new(1, 900);
    TestApp::with_config(config).await
}

async fn login_from(app: &TestApp, ip: &str) -> helpers::TestResponse {
    app.request_from(
        ip,
        "POST",
        "/auth/login",
        Some(serde_json::json!({
            "email": "nobody@acme.com",
            "password": "whatever",
            "aud": AUDIENCE,
        })),
        &[],
    )
    .await
}

#[tokio::test]
async fn test_login_limit_returns_429_with_retry_after() {
    let app = limited_app().await;

    assert_eq!(login_from(&app, "203.0.113.1").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(login_from(&app, "203.0.113.1").await.status, StatusCode::UNAUTHORIZED);

    let limited = login_from(&app, "203.0.113.1").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.error_code(), "RATE_LIMITED");

    let retry_after: u64 = limited
        .headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap();
    assert!((1..=60).contains(&retry_after));
}

#[tokio::test]
async fn test_limits_are_per_client_ip() {
    let app = limited_app().await;

    login_from(&app, "203.0.113.1").await;
    login_from(&app, "203.0.113.1").await;
    assert_eq!(
        login_from(&app, "203.0.113.1").await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    assert_eq!(login_from(&app, "203.0.113.2").await.status, StatusCode::UNAUTHORIZED);
}

async fn login_forwarded(app: &TestApp, forwarded_for: &str) -> helpers::TestResponse {
    app.request_forwarded(
        PROXY_IP,
        forwarded_for,
        "POST",
        "/auth/login",
        Some(serde_json::json!({
            "email": "nobody@acme.com",
            "password": "whatever",
            "aud": AUDIENCE,
        })),
    )
    .await
}

/// Four logins through the proxy, the `i`th carrying `forwarded_for(i)`.
async fn logins_through_proxy(
    app: &TestApp,
    forwarded_for: impl Fn(usize) -> String,
) -> Vec<StatusCode> {
    let mut statuses = Vec::new();
    for i in 0..4 {
        statuses.push(login_forwarded(app, &forwarded_for(i)).await.status);
    }
    statuses
}

#[tokio::test]
async fn test_forwarded_for_is_ignored_without_trusted_proxies() {
    let app = limited_app().await;

    let statuses = logins_through_proxy(&app, |i| format!("10.9.9.{i}")).await;
    assert_eq!(
        statuses,
        vec![
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );

    let events = app.store.recent(None, 10).await.unwrap();
    assert!(events.iter().all(|e| e.ip == PROXY_IP));
}

#[tokio::test]
async fn test_rotating_client_supplied_hops_does_not_bypass_limit() {
    let mut config = test_config();
    config.server.trusted_proxies = 1;
    config.rate_limit.login = WindowLimit::new(2, 60);
    let app = TestApp::with_config(config).await;

    let statuses = logins_through_proxy(&app, |i| format!("10.9.9.{i}, 198.51.100.7")).await;
    assert_eq!(
        statuses,
        vec![
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );

    let other_client = login_forwarded(&app, "198.51.100.8").await;
    assert_eq!(other_client.status, StatusCode::UNAUTHORIZED);

    let events = app.store.recent(None, 10).await.unwrap();
    assert!(events.iter().any(|e| e.ip == "198.51.100.7"));
    assert!(events.iter().all(|e| !e.ip.starts_with("10.9.9.")));
}

#[tokio::test]
async fn test_limited_logout_still_clears_cookies() {
    let mut config = test_config();
    config.rate_limit.logout = WindowLimit::new(1, 60);
    let app = TestApp::with_config(config).await;

    let logout = || app.request("POST", "/auth/logout", None, &[("refresh_token", "stale")]);
    assert_eq!(logout().await.status, StatusCode::OK);

    let limited = logout().await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.cookies.get("access_token").map(String::as_str), Some(""));
    assert_eq!(limited.cookies.get("refresh_token").map(String::as_str), Some(""));
}

#[tokio::test]
async fn test_categories_have_independent_windows() {
    let app = limited_app().await;

    let forgot = || {
        app.request_from(
            "203.0.113.1",
            "POST",
            "/auth/forgot-password",
            Some(serde_json::json!({ "email": "nobody@acme.com" })),
            &[],
        )
    };
    assert_eq!(forgot().await.status, StatusCode::OK);
    assert_eq!(forgot().await.status, StatusCode::TOO_MANY_REQUESTS);

    assert_eq!(login_from(&app, "203.0.113.1").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_discovery_and_health_are_never_limited() {
    let app = limited_app().await;

    for _ in 0..20 {
        let jwks = app
            .request_from("203.0.113.1", "GET", "/.well-known/jwks.json", None, &[])
            .await;
        assert_eq!(jwks.status, StatusCode::OK);
        let health = app
            .request_from("203.0.113.1", "GET", "/health", None, &[])
            .await;
        assert_eq!(health.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_disabled_limiter_admits_everything() {
    let mut config = test_config();
    config.rate_limit.enabled = false;
    config.rate_limit.login = WindowLimit::new(1, 60);
    let app = TestApp::with_config(config).await;

    for _ in 0..5 {
        assert_eq!(login_from(&app, "203.0.113.1").await.status, StatusCode::UNAUTHORIZED);
    }
}
