//! Integration tests for refresh rotation, reuse detection, session
//! limits and logout.

mod helpers;

use axum::http::StatusCode;
use chrono::Utc;

use authhub_auth::secret::hash_secret;
use authhub_database::store::SessionStore;
use authhub_entity::audit::AuditAction;

use helpers::{TestApp, test_config};

#[tokio::test]
async fn test_refresh_rotates_both_cookies() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;
    let cookies = app.login("alice@acme.com").await;

    let response = app.refresh(&cookies["refresh_token"]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_ne!(response.cookies["refresh_token"], cookies["refresh_token"]);
    assert!(response.cookies.contains_key("access_token"));

    let old = app
        .store
        .find_session_by_hash(&hash_secret(&cookies["refresh_token"]))
        .await
        .unwrap()
        .unwrap();
    assert!(old.revoked_at.is_some());

    let active = app
        .store
        .list_active_sessions(account.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].token_version, old.token_version);

    assert_eq!(
        app.audit_actions(Some(&account)).await,
        vec![AuditAction::LoginSuccess, AuditAction::TokenRefreshed]
    );
}

#[tokio::test]
async fn test_reused_refresh_token_revokes_every_session() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;
    let laptop = app.login("alice@acme.com").await;
    let phone = app.login("alice@acme.com").await;

    let rotated = app.refresh(&laptop["refresh_token"]).await;
    assert_eq!(rotated.status, StatusCode::OK);

    let replay = app.refresh(&laptop["refresh_token"]).await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.error_code(), "UNAUTHORIZED");

    assert!(
        app.store
            .list_active_sessions(account.id, Utc::now())
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        app.refresh(&phone["refresh_token"]).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.refresh(&rotated.cookies["refresh_token"]).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert!(
        app.audit_actions(Some(&account))
            .await
            .contains(&AuditAction::TokenReuseDetected)
    );
}

#[tokio::test]
async fn test_expired_refresh_token_is_rejected_without_mass_revocation() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;
    let stale = app.login("alice@acme.com").await;
    let fresh = app.login("alice@acme.com").await;

    let session = app
        .store
        .find_session_by_hash(&hash_secret(&stale["refresh_token"]))
        .await
        .unwrap()
        .unwrap();
    app.store
        .set_session_expiry(session.id, Utc::now() - chrono::Duration::seconds(1))
        .await;

    assert_eq!(
        app.refresh(&stale["refresh_token"]).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.refresh(&fresh["refresh_token"]).await.status,
        StatusCode::OK
    );
    assert!(
        !app.audit_actions(Some(&account))
            .await
            .contains(&AuditAction::TokenReuseDetected)
    );
}

#[tokio::test]
async fn test_refresh_without_cookie_is_unauthorized() {
    let app = TestApp::new().await;

    let missing = app.request("POST", "/auth/refresh", None, &[]).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let unknown = app.refresh("not-a-real-secret").await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.error_code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_eleventh_login_evicts_the_oldest_session() {
    let mut config = test_config();
    config.rate_limit.enabled = false;
    let app = TestApp::with_config(config).await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;

    let mut logins = Vec::new();
    for _ in 0..11 {
        logins.push(app.login("alice@acme.com").await);
    }

    let active = app
        .store
        .list_active_sessions(account.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(active.len(), 10);

    let oldest = app
        .store
        .find_session_by_hash(&hash_secret(&logins[0]["refresh_token"]))
        .await
        .unwrap()
        .unwrap();
    assert!(oldest.revoked_at.is_some());

    let second = app
        .store
        .find_session_by_hash(&hash_secret(&logins[1]["refresh_token"]))
        .await
        .unwrap()
        .unwrap();
    assert!(second.revoked_at.is_none());
}

#[tokio::test]
async fn test_force_logout_invalidates_unrotated_sessions() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;
    let cookies = app.login("alice@acme.com").await;

    let version = app.tenancy.force_logout(account.id).await.unwrap();
    assert_eq!(version, account.token_version + 1);

    assert_eq!(
        app.refresh(&cookies["refresh_token"]).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_refresh_after_license_lapse_is_rejected() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;
    let cookies = app.login("alice@acme.com").await;

    app.store
        .set_subscription_expiry(
            fixture.subscription.id,
            Utc::now() - chrono::Duration::seconds(1),
        )
        .await;

    let response = app.refresh(&cookies["refresh_token"]).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "LICENSE_EXPIRED");

    assert!(
        app.store
            .list_active_sessions(account.id, Utc::now())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_refresh_for_deactivated_account_is_rejected() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;
    let cookies = app.login("alice@acme.com").await;

    app.tenancy
        .set_account_active(account.id, false)
        .await
        .unwrap();

    let response = app.refresh(&cookies["refresh_token"]).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_logout_revokes_and_clears_cookies() {
    let app = TestApp::new().await;
    let fixture = app.create_tenant("acme").await;
    let account = app.create_user(&fixture.tenant, "alice@acme.com").await;
    let cookies = app.login("alice@acme.com").await;

    let response = app
        .request(
            "POST",
            "/auth/logout",
            None,
            &[("refresh_token", cookies["refresh_token"].as_str())],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.cookies.get("access_token").map(String::as_str), Some(""));
    assert_eq!(response.cookies.get("refresh_token").map(String::as_str), Some(""));
    assert!(
        app.store
            .list_active_sessions(account.id, Utc::now())
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        app.audit_actions(Some(&account)).await.last(),
        Some(&AuditAction::Logout)
    );
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = TestApp::new().await;

    let anonymous = app.request("POST", "/auth/logout", None, &[]).await;
    assert_eq!(anonymous.status, StatusCode::OK);

    let unknown = app
        .request(
            "POST",
            "/auth/logout",
            None,
            &[("refresh_token", "already-gone")],
        )
        .await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert!(unknown.set_cookie_for("refresh_token").is_some());
}
