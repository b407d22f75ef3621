//! Storage traits for the identity provider.
//!
//! Every invariant the authentication core relies on is owned by the store,
//! not by its callers:
//!
//! - emails and tenant subdomains are unique;
//! - a tenant has at most one `ACTIVE` subscription, even under concurrent
//!   inserts;
//! - a refresh session hash maps to at most one row;
//! - rotating a session revokes the old row and inserts the new one as one
//!   unit, and reports a lost race instead of inserting twice.
//!
//! [`CredentialStore`] bundles one implementation of each trait so services
//! can be wired by explicit construction.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use authhub_core::config::{DatabaseBackend, DatabaseConfig};
use authhub_core::result::AppResult;
use authhub_entity::account::{Account, AccountWithTenant, ActionTokenKind, CreateAccount};
use authhub_entity::audit::{AuditEvent, CreateAuditEvent};
use authhub_entity::plan::{CreatePlan, Plan};
use authhub_entity::session::{NewRefreshSession, RefreshSession};
use authhub_entity::subscription::{CreateSubscription, Subscription, SubscriptionStatus};
use authhub_entity::tenant::{CreateTenant, Tenant};

use crate::repositories::{
    AccountRepository, AuditRepository, PostgresHealth, SessionRepository,
    SubscriptionRepository, TenantRepository,
};

use crate::connection::DatabasePool;
use crate::migration::run_migrations;

use self::memory::MemoryStore;

/// Account persistence.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch an account and its tenant by normalized email in one read.
    async fn find_with_tenant_by_email(&self, email: &str)
    -> AppResult<Option<AccountWithTenant>>;

    /// Fetch an account and its tenant by id in one read.
    async fn find_with_tenant_by_id(&self, id: Uuid) -> AppResult<Option<AccountWithTenant>>;

    /// Create an account. Fails with `Conflict` on a duplicate email.
    async fn create_account(&self, data: &CreateAccount) -> AppResult<Account>;

    /// Store a one-time token hash in the slot for `kind`, replacing any previous one.
    async fn set_action_token(
        &self,
        account_id: Uuid,
        kind: ActionTokenKind,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Find the account holding `token_hash` in the slot for `kind`.
    async fn find_by_action_token(
        &self,
        kind: ActionTokenKind,
        token_hash: &str,
    ) -> AppResult<Option<Account>>;

    /// Replace the password, clear the reset token and bump `token_version`,
    /// provided the reset token still matches and is unexpired at `now`.
    ///
    /// Returns the new `token_version`, or `None` if the token was already
    /// consumed or expired.
    async fn complete_password_reset(
        &self,
        account_id: Uuid,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<i32>>;

    /// Mark the email verified and the account active, clearing the
    /// verification token, provided it still matches and is unexpired.
    async fn complete_email_verification(
        &self,
        account_id: Uuid,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Activate or deactivate an account.
    async fn set_account_active(&self, account_id: Uuid, active: bool) -> AppResult<()>;

    /// Increment `token_version`, invalidating every outstanding session lineage.
    async fn bump_token_version(&self, account_id: Uuid) -> AppResult<i32>;

    /// Delete an account together with its refresh sessions.
    async fn delete_account(&self, account_id: Uuid) -> AppResult<bool>;
}

/// Tenant and plan persistence.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Create a plan. Fails with `Conflict` on a duplicate name.
    async fn create_plan(&self, data: &CreatePlan) -> AppResult<Plan>;

    /// Find a plan by name.
    async fn find_plan_by_name(&self, name: &str) -> AppResult<Option<Plan>>;

    /// Create a tenant. Fails with `Conflict` on a duplicate subdomain.
    async fn create_tenant(&self, data: &CreateTenant) -> AppResult<Tenant>;

    /// Find a tenant by subdomain.
    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> AppResult<Option<Tenant>>;

    /// Activate or deactivate a tenant.
    async fn set_tenant_active(&self, tenant_id: Uuid, active: bool) -> AppResult<()>;

    /// Delete a tenant. Fails with `Conflict` while accounts or subscriptions reference it.
    async fn delete_tenant(&self, tenant_id: Uuid) -> AppResult<bool>;

    /// Delete a plan. Fails with `Conflict` while subscriptions reference it.
    async fn delete_plan(&self, plan_id: Uuid) -> AppResult<bool>;
}

/// Subscription persistence.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Open an `ACTIVE` subscription.
    ///
    /// Fails with `Conflict` if the tenant already has one, including when a
    /// concurrent insert wins the race.
    async fn create_subscription(&self, data: &CreateSubscription) -> AppResult<Subscription>;

    /// The tenant's `ACTIVE` subscription that is unexpired at `now`.
    async fn find_current_subscription(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Subscription>>;

    /// Change a subscription's status. Re-activating may fail with `Conflict`.
    async fn set_subscription_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> AppResult<Subscription>;

    /// All subscriptions of a tenant, newest first.
    async fn list_subscriptions(&self, tenant_id: Uuid) -> AppResult<Vec<Subscription>>;
}

/// Refresh session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session after evicting the oldest active one if the account
    /// already holds `limit` active sessions. Both steps form one unit.
    ///
    /// Returns the new session and the id of the evicted session, if any.
    async fn insert_session_within_limit(
        &self,
        data: &NewRefreshSession,
        limit: u32,
        now: DateTime<Utc>,
    ) -> AppResult<(RefreshSession, Option<Uuid>)>;

    /// Revoke the oldest active session if the account holds at least
    /// `limit` active sessions.
    async fn revoke_oldest_beyond_limit(
        &self,
        account_id: Uuid,
        limit: u32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>>;

    /// Find a session by secret hash, in any state.
    async fn find_session_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>>;

    /// Revoke `current_id` and insert `next` as one unit.
    ///
    /// Returns `None`, inserting nothing, if `current_id` was already revoked
    /// by the time the unit ran.
    async fn rotate_session(
        &self,
        current_id: Uuid,
        next: &NewRefreshSession,
    ) -> AppResult<Option<RefreshSession>>;

    /// Sessions that are neither revoked nor expired at `now`, oldest first.
    async fn list_active_sessions(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RefreshSession>>;

    /// Revoke one session by id. Returns `false` if it was already revoked.
    async fn revoke_session(&self, session_id: Uuid) -> AppResult<bool>;

    /// Revoke the session with `token_hash`, returning it if it existed.
    async fn revoke_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>>;

    /// Revoke every unrevoked session of an account. Returns how many changed.
    async fn revoke_all_for_account(&self, account_id: Uuid) -> AppResult<u64>;

    /// Delete sessions that are revoked or expired at `now`.
    async fn sweep_expired_or_revoked(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Append-only audit persistence.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an event.
    async fn append(&self, event: &CreateAuditEvent) -> AppResult<AuditEvent>;

    /// Most recent events, optionally for one account, newest first.
    async fn recent(&self, account_id: Option<Uuid>, limit: i64) -> AppResult<Vec<AuditEvent>>;
}

/// Liveness probe for the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Round-trip to the store.
    async fn ping(&self) -> AppResult<()>;
}

/// One implementation of every storage trait.
#[derive(Clone)]
pub struct CredentialStore {
    /// Accounts.
    pub accounts: Arc<dyn AccountStore>,
    /// Tenants and plans.
    pub tenants: Arc<dyn TenantStore>,
    /// Subscriptions.
    pub subscriptions: Arc<dyn SubscriptionStore>,
    /// Refresh sessions.
    pub sessions: Arc<dyn SessionStore>,
    /// Audit trail.
    pub audit: Arc<dyn AuditStore>,
    /// Liveness.
    pub health: Arc<dyn StoreHealth>,
}

impl CredentialStore {
    /// Repositories over a PostgreSQL pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            accounts: Arc::new(AccountRepository::new(pool.clone())),
            tenants: Arc::new(TenantRepository::new(pool.clone())),
            subscriptions: Arc::new(SubscriptionRepository::new(pool.clone())),
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            audit: Arc::new(AuditRepository::new(pool.clone())),
            health: Arc::new(PostgresHealth::new(pool)),
        }
    }

    /// Opens the store selected by `database.backend`, applying migrations
    /// first when configured.
    pub async fn open(config: &DatabaseConfig) -> AppResult<Self> {
        match config.backend {
            DatabaseBackend::Postgres => {
                let pool = DatabasePool::connect(config).await?.into_pool();
                if config.run_migrations {
                    run_migrations(&pool).await?;
                }
                Ok(Self::postgres(pool))
            }
            DatabaseBackend::Memory => {
                warn!("Using the in-memory credential store; data is lost on exit");
                Ok(Self::memory(Arc::new(MemoryStore::new())))
            }
        }
    }

    /// Every trait served by one shared in-memory store.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            accounts: store.clone(),
            tenants: store.clone(),
            subscriptions: store.clone(),
            sessions: store.clone(),
            audit: store.clone(),
            health: store,
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}
