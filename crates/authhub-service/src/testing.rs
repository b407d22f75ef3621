//! Shared fixture for the flow tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use authhub_auth::audit::{AuditRecorder, ClientContext};
use authhub_auth::jwt::{SigningKeys, TokenIssuer};
use authhub_auth::license::LicenseGate;
use authhub_auth::password::PasswordHasher;
use authhub_auth::session::SessionManager;
use authhub_core::config::AuthConfig;
use authhub_core::result::AppResult;
use authhub_database::store::memory::MemoryStore;
use authhub_database::store::{AccountStore, CredentialStore, SubscriptionStore, TenantStore};
use authhub_entity::account::{Account, AccountRole, CreateAccount};
use authhub_entity::plan::CreatePlan;
use authhub_entity::subscription::{CreateSubscription, Subscription};
use authhub_entity::tenant::{CreateTenant, PlanTier, Tenant};

use crate::auth::AuthEngine;
use crate::notifier::{Notification, NotificationDispatcher, Notifier};
use crate::tenancy::TenancyService;

pub const PASSWORD: &str = "Correct-Horse-Battery-42";
pub const PRIVATE_PEM: &str = include_str!("../../../tests/fixtures/jwt_private.pem");
pub const PUBLIC_PEM: &str = include_str!("../../../tests/fixtures/jwt_public.pem");

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

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub engine: AuthEngine,
    pub tenancy: TenancyService,
    pub notifier: Arc<RecordingNotifier>,
    pub ctx: ClientContext,
    pub tenant: Tenant,
    pub subscription: Subscription,
    pub member: Account,
    password_hash: String,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = AuthConfig {
            key_id: "test-key".to_string(),
            allowed_audiences: vec!["app1".to_string(), "app2".to_string()],
            root_domain: "root.com".to_string(),
            ..AuthConfig::default()
        };

        let keys = Arc::new(SigningKeys::from_private_pem(&config.key_id, PRIVATE_PEM).unwrap());
        let issuer = Arc::new(TokenIssuer::new(keys, &config));
        let audit = AuditRecorder::new(store.clone());
        let sessions = SessionManager::new(store.clone(), audit.clone(), &config);
        let hasher = PasswordHasher::new(&config).unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = NotificationDispatcher::new(notifier.clone(), Duration::from_secs(5));

        let engine = AuthEngine::new(
            store.clone(),
            issuer,
            sessions,
            LicenseGate::new(store.clone()),
            audit,
            hasher.clone(),
            dispatcher,
            config.clone(),
        );
        let tenancy = TenancyService::new(
            &CredentialStore::memory(store.clone()),
            engine.clone(),
            hasher.clone(),
            &config,
        );

        let plan = store
            .create_plan(&CreatePlan {
                name: "PRO".to_string(),
                price_cents: 4900,
                max_users: 50,
                features: serde_json::json!({}),
            })
            .await
            .unwrap();
        let tenant = store
            .create_tenant(&CreateTenant {
                name: "Acme".to_string(),
                subdomain: "acme".to_string(),
                plan: PlanTier::Pro,
            })
            .await
            .unwrap();
        let subscription = store
            .create_subscription(&CreateSubscription {
                tenant_id: tenant.id,
                plan_id: plan.id,
                expires_at: Utc::now() + chrono::Duration::days(30),
            })
            .await
            .unwrap();
        let password_hash = hasher.hash_password(PASSWORD).await.unwrap();

        let member = insert_account(&store, tenant.id, &password_hash, "a@x.com", true).await;

        Self {
            store,
            engine,
            tenancy,
            notifier,
            ctx: ClientContext::new("203.0.113.7", "test-agent"),
            tenant,
            subscription,
            member,
            password_hash,
        }
    }

    /// A USER in the fixture tenant. Unverified accounts are also inactive.
    pub async fn add_account(&self, email: &str, verified: bool) -> Account {
        insert_account(&self.store, self.tenant.id, &self.password_hash, email, verified).await
    }

    /// The raw secret of the most recent notification of `kind`.
    pub async fn last_token(&self, kind: &str) -> String {
        for _ in 0..64 {
            tokio::task::yield_now().await;
        }
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
}

async fn insert_account(
    store: &MemoryStore,
    tenant_id: uuid::Uuid,
    password_hash: &str,
    email: &str,
    verified: bool,
) -> Account {
    store
        .create_account(&CreateAccount {
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            tenant_id: Some(tenant_id),
            role: AccountRole::User,
            active: verified,
            email_verified_at: verified.then(Utc::now),
        })
        .await
        .unwrap()
}
