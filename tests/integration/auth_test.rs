//! Integration tests for the login flow, key discovery and health.

mod helpers;

use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use chrono::Utc;

use authhub_auth::jwt::Jwks;
use authhub_client::TokenVerifier;
use authhub_entity::account::AccountRole;
use authhub_entity::audit::AuditAction;
use authhub_entity::tenant::PlanTier;

use helpers::{AUDIENCE, PASSWORD, TestApp};

#[tokio::test]
async fn test_login_success_sets_cookies() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;

    let response = app.post_login("alice@acme.com", PASSWORD, AUDIENCE).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["redirect"], "https://auth.root.com");
    assert_eq!(response.cookies["refresh_token"].len(), 128);

    let access_cookie = response.set_cookie_for("access_token").unwrap();
    assert!(access_cookie.contains("HttpOnly"));
    assert!(access_cookie.contains("SameSite=Lax"));
    assert!(access_cookie.contains("Path=/"));
    assert!(!access_cookie.contains("Secure"));
    assert!(!access_cookie.contains("Domain="));

    assert_eq!(
        app.audit_actions(Some(&account)).await,
        vec![AuditAction::LoginSuccess]
    );
}

#[tokio::test]
async fn test_access_token_verifies_against_published_keys() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;
    let cookies = app.login("alice@acme.com").await;

    let discovery = app.request("GET", "/.well-known/jwks.json", None, &[]).await;
    assert_eq!(discovery.status, StatusCode::OK);
    assert_eq!(
        discovery.headers.get(CACHE_CONTROL).unwrap(),
        "public, max-age=300"
    );
    let jwks: Jwks = serde_json::from_value(discovery.body).unwrap();
    assert_eq!(jwks.keys.len(), 1);
    assert_eq!(jwks.keys[0].kid, "test-key");
    assert_eq!(jwks.keys[0].alg, "RS256");

    let verifier = TokenVerifier::from_jwks(&jwks, "authhub", &[AUDIENCE]).unwrap();
    let claims = verifier.verify(&cookies["access_token"]).await.unwrap();
    assert_eq!(claims.sub, account.id);
    assert_eq!(claims.aud, AUDIENCE);
    assert_eq!(claims.role, AccountRole::User);
    assert_eq!(claims.tenant_id, Some(fixture.tenant.id));
    assert_eq!(claims.tenant_subdomain.as_deref(), Some("acme"));
    assert_eq!(claims.plan, Some(PlanTier::Pro));
    assert_eq!(claims.token_version, account.token_version);
    assert_eq!(claims.exp - claims.iat, 900);

    let other_app = TokenVerifier::from_jwks(&jwks, "authhub", &["app2"]).unwrap();
    assert!(other_app.verify(&cookies["access_token"]).await.is_err());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;

    let wrong_password = app
        .post_login("alice@acme.com", "not-the-password", AUDIENCE)
        .await;
    let unknown = app.post_login("nobody@acme.com", PASSWORD, AUDIENCE).await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown.body);
    assert_eq!(wrong_password.error_code(), "INVALID_CREDENTIALS");
    assert!(wrong_password.cookies.is_empty());
    assert_eq!(
        app.audit_actions(Some(&account)).await,
        vec![AuditAction::LoginFailed]
    );
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    app.create_user(&fixture.tenant, "alice@acme.com").await;

    let response = app.post_login("  Alice@ACME.com", PASSWORD, AUDIENCE).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unverified_email_blocks_login() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app
        .insert_account(
            Some(fixture.tenant.id),
            "new@acme.com",
            AccountRole::User,
            false,
        )
        .await;

    let response = app.post_login("new@acme.com", PASSWORD, AUDIENCE).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "INVALID_CREDENTIALS");
    assert_eq!(
        app.audit_actions(Some(&account)).await,
        vec![AuditAction::LoginBlockedEmailNotVerified]
    );
}

#[tokio::test]
async fn test_unknown_audience_is_forbidden() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    app.create_user(&fixture.tenant, "alice@acme.com").await;

    let response = app
        .post_login("alice@acme.com", PASSWORD, "someone-elses-app")
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.cookies.is_empty());
}

#[tokio::test]
async fn test_inactive_account_and_tenant_cannot_log_in() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;

    app.tenancy.set_account_active(account.id, false).await.unwrap();
    let response = app.post_login("alice@acme.com", PASSWORD, AUDIENCE).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    app.tenancy.set_account_active(account.id, true).await.unwrap();
    app.tenancy
        .set_tenant_active(fixture.tenant.id, false)
        .await
        .unwrap();
    let response = app.post_login("alice@acme.com", PASSWORD, AUDIENCE).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_expired_license_blocks_login() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;
    app.store
        .set_subscription_expiry(
            fixture.subscription.id,
            Utc::now() - chrono::Duration::minutes(1),
        )
        .await;

    let response = app.post_login("alice@acme.com", PASSWORD, AUDIENCE).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "INVALID_CREDENTIALS");
    assert_eq!(
        app.audit_actions(Some(&account)).await,
        vec![AuditAction::LicenseExpired]
    );
}

#[tokio::test]
async fn test_superadmin_logs_in_without_tenant() {
    let app = TestApp::new().await;
    app.create_superadmin("root@root.com").await;

    let cookies = app.login("root@root.com").await;
    assert!(cookies.contains_key("access_token"));
}

#[tokio::test]
async fn test_redirect_hint_must_stay_on_root_domain() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    app.create_user(&fixture.tenant, "alice@acme.com").await;

    let login = |redirect: &'static str| {
        app.request(
            "POST",
            "/auth/login",
            Some(serde_json::json!({
                "email": "alice@acme.com",
                "password": PASSWORD,
                "aud": AUDIENCE,
                "redirect": redirect,
            })),
            &[],
        )
    };

    let safe = login("https://app1.root.com/dashboard").await;
    assert_eq!(safe.body["redirect"], "https://app1.root.com/dashboard");

    let unsafe_hint = login("https://root.com.evil.com/").await;
    assert_eq!(unsafe_hint.body["redirect"], "https://auth.root.com");
}

#[tokio::test]
async fn test_malformed_login_body_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/auth/login",
            Some(serde_json::json!({
                "email": "not-an-email",
                "password": PASSWORD,
                "aud": AUDIENCE,
            })),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");

    let response = app
        .request(
            "POST",
            "/auth/login",
            Some(serde_json::json!({ "email": "a@acme.com" })),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_production_cookies_are_secure_and_shared() {
    let mut config = helpers::test_config();
    config.auth.production = true;
    let app = TestApp::with_config(config).await;
    let fixture = app.create_tenant("acme").await;
    app.create_user(&fixture.tenant, "alice@acme.com").await;

    let response = app.post_login("alice@acme.com", PASSWORD, AUDIENCE).await;

    let cookie = response.set_cookie_for("refresh_token").unwrap();
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Domain=root.com") || cookie.contains("Domain=.root.com"));
}

#[tokio::test]
async fn test_health_reports_store_up() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/health", None, &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["services"]["database"]["status"], "up");
}
