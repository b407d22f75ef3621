//! Shared test helpers for integration tests.
//!
//! Every test gets its own in-memory store, fixture signing keys and a
//! notifier that records instead of sending, so tests run without
//! PostgreSQL or a mail relay.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use authhub_api::{AppState, build_app};
use authhub_auth::PasswordHasher;
use authhub_auth::jwt::SigningKeys;
use authhub_core::config::{AppConfig, DatabaseBackend};
use authhub_core::result::AppResult;
use authhub_database::CredentialStore;
use authhub_database::store::memory::MemoryStore;
use authhub_database::store::{AccountStore, AuditStore, TenantStore};
use authhub_entity::account::{Account, AccountRole, CreateAccount};
use authhub_entity::audit::AuditAction;
use authhub_entity::plan::CreatePlan;
use authhub_entity::subscription::Subscription;
use authhub_entity::tenant::{PlanTier, Tenant};
use authhub_service::{Notification, NotificationDispatcher, Notifier, TenancyService};

/// Password every fixture account is created with.
pub const PASSWORD: &str = "Correct-Horse-Battery-42";
/// Audience the fixture apps log in to.
pub const AUDIENCE: &str = "app1";
/// Client IP sent with every request unless overridden.
pub const CLIENT_IP: &str = "198.51.100.10";

pub const PRIVATE_PEM: &str = include_str!("../fixtures/jwt_private.pem");
pub const PUBLIC_PEM: &str = include_str!("../fixtures/jwt_public.pem");

/// Captures notifications instead of delivering them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> AppResult<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        Ok(())
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum app, middleware included
    pub router: Router,
    /// Backing store for direct inspection
    pub store: Arc<MemoryStore>,
    /// Provisioning service, as used by the CLI
    pub tenancy: TenancyService,
    /// Notifications handed to the dispatcher
    pub notifier: Arc<RecordingNotifier>,
    /// Application config
    pub config: AppConfig,
    dispatcher: NotificationDispatcher,
    hasher: PasswordHasher,
}

/// The fixture tenant with a current subscription.
pub struct Fixture {
    pub tenant: Tenant,
    pub subscription: Subscription,
}

impl TestApp {
    /// Create a test application with default limits
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a test application from an adjusted config
    pub async fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let credential_store = CredentialStore::memory(store.clone());
        let keys = Arc::new(
            SigningKeys::from_private_pem(&config.auth.key_id, PRIVATE_PEM)
                .expect("Failed to load fixture key"),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = NotificationDispatcher::new(notifier.clone(), Duration::from_secs(5));

        let state = AppState::build(config.clone(), credential_store.clone(), keys, dispatcher.clone())
            .expect("Failed to build state");
        let hasher = state.engine.hasher().clone();
        let tenancy = TenancyService::new(
            &credential_store,
            state.engine.clone(),
            hasher.clone(),
            &config.auth,
        );

        Self {
            router: build_app(state),
            store,
            tenancy,
            notifier,
            config,
            dispatcher,
            hasher,
        }
    }

    /// A tenant on the PRO plan with a 30 day subscription.
    pub async fn create_tenant(&self, subdomain: &str) -> Fixture {
        let existing = self
            .store
            .find_plan_by_name("PRO")
            .await
            .expect("Failed to look up plan");
        if existing.is_none() {
            self.tenancy
                .create_plan(&CreatePlan {
                    name: "PRO".to_string(),
                    price_cents: 4900,
                    max_users: 50,
                    features: serde_json::json!({}),
                })
                .await
                .expect("Failed to create plan");
        }
        let tenant = self
            .tenancy
            .create_tenant(subdomain, subdomain, PlanTier::Pro)
            .await
            .expect("Failed to create tenant");
        let subscription = self
            .tenancy
            .create_subscription(tenant.id, "PRO", Utc::now() + chrono::Duration::days(30))
            .await
            .expect("Failed to create subscription");
        Fixture {
            tenant,
            subscription,
        }
    }

    /// An active, verified USER of `tenant`.
    pub async fn create_user(&self, tenant: &Tenant, email: &str) -> Account {
        self.insert_account(Some(tenant.id), email, AccountRole::User, true)
            .await
    }

    /// A verified super-administrator.
    pub async fn create_superadmin(&self, email: &str) -> Account {
        self.insert_account(None, email, AccountRole::SuperAdmin, true)
            .await
    }

    /// Insert an account directly, bypassing provisioning.
    pub async fn insert_account(
        &self,
        tenant_id: Option<uuid::Uuid>,
        email: &str,
        role: AccountRole,
        verified: bool,
    ) -> Account {
        let password_hash = self
            .hasher
            .hash_password(PASSWORD)
            .await
            .expect("Failed to hash password");
        self.store
            .create_account(&CreateAccount {
                email: email.to_string(),
                password_hash,
                tenant_id,
                role,
                active: verified,
                email_verified_at: verified.then(Utc::now),
            })
            .await
            .expect("Failed to create account")
    }

    /// Log in and return the cookies the response set.
    pub async fn login(&self, email: &str) -> HashMap<String, String> {
        let response = self.post_login(email, PASSWORD, AUDIENCE).await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );
        response.cookies
    }

    pub async fn post_login(&self, email: &str, password: &str, aud: &str) -> TestResponse {
        self.request(
            "POST",
            "/auth/login",
            Some(serde_json::json!({
                "email": email,
                "password": password,
                "aud": aud,
            })),
            &[],
        )
        .await
    }

    /// `POST /auth/refresh` presenting `refresh_token`.
    pub async fn refresh(&self, refresh_token: &str) -> TestResponse {
        self.request(
            "POST",
            "/auth/refresh",
            None,
            &[("refresh_token", refresh_token)],
        )
        .await
    }

    /// Raw secret of the most recent notification of `kind`.
    pub async fn last_token(&self, kind: &str) -> String {
        self.dispatcher.flush().await;
        self.notifier
            .sent()
            .into_iter()
            .rev()
            .find(|n| n.kind() == kind)
            .map(|n| match n {
                Notification::PasswordReset { token, .. }
                | Notification::EmailVerification { token, .. } => token,
            })
            .unwrap_or_else(|| panic!("no {kind} notification was sent"))
    }

    /// Audit actions recorded for `account`, oldest first.
    pub async fn audit_actions(&self, account: Option<&Account>) -> Vec<AuditAction> {
        let mut events = self
            .store
            .recent(account.map(|a| a.id), 100)
            .await
            .expect("Failed to read audit trail");
        events.reverse();
        events.into_iter().map(|e| e.action).collect()
    }

    /// Make an HTTP request from [`CLIENT_IP`]
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookies: &[(&str, &str)],
    ) -> TestResponse {
        self.request_from(CLIENT_IP, method, path, body, cookies)
            .await
    }

    /// Make an HTTP request to the test app from peer address `ip`
    pub async fn request_from(
        &self,
        ip: &str,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookies: &[(&str, &str)],
    ) -> TestResponse {
        self.send(ip, None, method, path, body, cookies).await
    }

    /// Make an HTTP request arriving from proxy `peer` with an
    /// `X-Forwarded-For` chain
    pub async fn request_forwarded(
        &self,
        peer: &str,
        forwarded_for: &str,
        method: &str,
        path: &str,
        body: Option<Value>,
    ) -> TestResponse {
        self.send(peer, Some(forwarded_for), method, path, body, &[])
            .await
    }

    async fn send(
        &self,
        peer: &str,
        forwarded_for: Option<&str>,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookies: &[(&str, &str)],
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();
        let peer: IpAddr = peer.parse().expect("Invalid peer address");

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(CONTENT_TYPE, "application/json")
            .header("user-agent", "authhub-tests")
            .extension(ConnectInfo(SocketAddr::new(peer, 40_000)));

        if let Some(chain) = forwarded_for {
            req = req.header("x-forwarded-for", chain);
        }

        if !cookies.is_empty() {
            let header = cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            req = req.header(COOKIE, header);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            cookies: parse_set_cookies(&headers),
            set_cookie: headers
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok().map(str::to_string))
                .collect(),
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// `name -> value` of every cookie set by the response
    pub cookies: HashMap<String, String>,
    /// Raw `Set-Cookie` header values
    pub set_cookie: Vec<String>,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The machine-readable error code of an error body.
    pub fn error_code(&self) -> &str {
        self.body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The raw `Set-Cookie` value for `name`.
    pub fn set_cookie_for(&self, name: &str) -> Option<&str> {
        let prefix = format!("{name}=");
        self.set_cookie
            .iter()
            .find(|c| c.starts_with(&prefix))
            .map(String::as_str)
    }
}

/// Config with the fixture key id, two audiences and the memory store.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.backend = DatabaseBackend::Memory;
    config.auth.key_id = "test-key".to_string();
    config.auth.allowed_audiences = vec![AUDIENCE.to_string(), "app2".to_string()];
    config.auth.root_domain = "root.com".to_string();
    config.worker.enabled = false;
    config
}

fn parse_set_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}
