//! Integration tests for password reset and email verification.

mod helpers;

use axum::http::StatusCode;

use authhub_entity::account::AccountRole;
use authhub_entity::audit::AuditAction;
use authhub_service::CreateAccountRequest;

use helpers::{AUDIENCE, PASSWORD, TestApp};

const NEW_PASSWORD: &str = "Tangerine-Lighthouse-Quartz-7";

async fn forgot(app: &TestApp, email: &str) -> helpers::TestResponse {
    app.request(
        "POST",
        "/auth/forgot-password",
        Some(serde_json::json!({ "email": email })),
        &[],
    )
    .await
}

async fn reset(app: &TestApp, token: &str, password: &str) -> helpers::TestResponse {
    app.request(
        "POST",
        "/auth/reset-password",
        Some(serde_json::json!({ "token": token, "password": password })),
        &[],
    )
    .await
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    app.create_user(&fixture.tenant, "alice@acme.com").await;

    let known = forgot(&app, "alice@acme.com").await;
    let unknown = forgot(&app, "nobody@acme.com").await;

    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(known.body, unknown.body);

    app.last_token("password_reset").await;
    let recipients: Vec<String> = app
        .notifier
        .sent()
        .iter()
        .map(|n| n.recipient().to_string())
        .collect();
    assert_eq!(recipients, vec!["alice@acme.com".to_string()]);
}

#[tokio::test]
async fn test_reset_password_replaces_password_and_ends_sessions() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;
    let before = app.login("alice@acme.com").await;

    forgot(&app, "alice@acme.com").await;
    let token = app.last_token("password_reset").await;

    let response = reset(&app, &token, NEW_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Password has been reset");

    assert_eq!(
        app.post_login("alice@acme.com", PASSWORD, AUDIENCE)
            .await
            .status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.post_login("alice@acme.com", NEW_PASSWORD, AUDIENCE)
            .await
            .status,
        StatusCode::OK
    );
    assert_eq!(
        app.refresh(&before["refresh_token"]).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert!(
        app.audit_actions(Some(&account))
            .await
            .contains(&AuditAction::PasswordReset)
    );
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    app.create_user(&fixture.tenant, "alice@acme.com").await;

    forgot(&app, "alice@acme.com").await;
    let token = app.last_token("password_reset").await;

    assert_eq!(reset(&app, &token, NEW_PASSWORD).await.status, StatusCode::OK);

    let replay = reset(&app, &token, "Another-Solid-Passphrase-9").await;
    assert_eq!(replay.status, StatusCode::BAD_REQUEST);
    assert_eq!(replay.body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_reset_rejects_weak_password_and_keeps_token() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    app.create_user(&fixture.tenant, "alice@acme.com").await;

    forgot(&app, "alice@acme.com").await;
    let token = app.last_token("password_reset").await;

    let weak = reset(&app, &token, "password").await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
    assert_eq!(weak.error_code(), "VALIDATION_ERROR");

    assert_eq!(reset(&app, &token, NEW_PASSWORD).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_provisioned_account_logs_in_after_verification() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app
        .tenancy
        .create_account(&CreateAccountRequest {
            email: "bob@acme.com".to_string(),
            password: PASSWORD.to_string(),
            role: AccountRole::User,
            tenant_id: Some(fixture.tenant.id),
        })
        .await
        .unwrap();
    assert!(!account.active);

    assert_eq!(
        app.post_login("bob@acme.com", PASSWORD, AUDIENCE).await.status,
        StatusCode::UNAUTHORIZED
    );

    let token = app.last_token("email_verification").await;
    let response = app
        .request(
            "GET",
            &format!("/auth/verify-email?token={token}"),
            None,
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["message"], "Email verified");

    assert_eq!(
        app.post_login("bob@acme.com", PASSWORD, AUDIENCE).await.status,
        StatusCode::OK
    );
    assert!(
        app.audit_actions(Some(&account))
            .await
            .contains(&AuditAction::EmailVerified)
    );
}

#[tokio::test]
async fn test_verification_and_reset_tokens_are_not_interchangeable() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    app.tenancy
        .create_account(&CreateAccountRequest {
            email: "bob@acme.com".to_string(),
            password: PASSWORD.to_string(),
            role: AccountRole::User,
            tenant_id: Some(fixture.tenant.id),
        })
        .await
        .unwrap();
    let verification = app.last_token("email_verification").await;

    let response = reset(&app, &verification, NEW_PASSWORD).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    forgot(&app, "bob@acme.com").await;
    let reset_token = app.last_token("password_reset").await;
    let response = app
        .request(
            "GET",
            &format!("/auth/verify-email?token={reset_token}"),
            None,
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_email_requires_token() {
    let app = TestApp::new().await;

    let missing = app.request("GET", "/auth/verify-email", None, &[]).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["message"], "Invalid or expired token");

    let bogus = app
        .request("GET", "/auth/verify-email?token=deadbeef", None, &[])
        .await;
    assert_eq!(bogus.status, StatusCode::BAD_REQUEST);
}
