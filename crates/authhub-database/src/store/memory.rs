//! In-memory credential store for tests and single-node development.
//!
//! All state lives behind one Tokio mutex, so every trait method is a
//! single critical section and observes the same uniqueness and
//! referential rules as the PostgreSQL schema.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_entity::account::model::normalize_email;
use authhub_entity::account::{Account, AccountWithTenant, ActionTokenKind, CreateAccount};
use authhub_entity::audit::{AuditEvent, CreateAuditEvent};
use authhub_entity::plan::{CreatePlan, Plan};
use authhub_entity::session::{NewRefreshSession, RefreshSession};
use authhub_entity::subscription::{CreateSubscription, Subscription, SubscriptionStatus};
use authhub_entity::tenant::{CreateTenant, Tenant};

use super::{AccountStore, AuditStore, SessionStore, StoreHealth, SubscriptionStore, TenantStore};

/// Internal state of the memory store.
#[derive(Debug, Default)]
struct InnerState {
    accounts: HashMap<Uuid, Account>,
    tenants: HashMap<Uuid, Tenant>,
    plans: HashMap<Uuid, Plan>,
    subscriptions: HashMap<Uuid, Subscription>,
    sessions: HashMap<Uuid, RefreshSession>,
    audit: Vec<AuditEvent>,
    next_seq: i64,
}

impl InnerState {
    fn with_tenant(&self, account: &Account) -> AccountWithTenant {
        AccountWithTenant {
            account: account.clone(),
            tenant: account
                .tenant_id
                .and_then(|id| self.tenants.get(&id).cloned()),
        }
    }

    fn account_mut(&mut self, account_id: Uuid) -> AppResult<&mut Account> {
        self.accounts
            .get_mut(&account_id)
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))
    }

    fn active_sessions(&self, account_id: Uuid, now: DateTime<Utc>) -> Vec<&RefreshSession> {
        let mut active: Vec<&RefreshSession> = self
            .sessions
            .values()
            .filter(|s| s.account_id == account_id && s.revoked_at.is_none() && s.expires_at > now)
            .collect();
        active.sort_by_key(|s| (s.created_at, s.seq));
        active
    }

    /// Revoke the oldest active sessions so that at most `keep` remain.
    fn evict_oldest(&mut self, account_id: Uuid, keep: usize, now: DateTime<Utc>) -> Option<Uuid> {
        let active: Vec<Uuid> = self
            .active_sessions(account_id, now)
            .iter()
            .map(|s| s.id)
            .collect();
        if active.len() <= keep {
            return None;
        }
        let evicted = &active[..active.len() - keep];
        for id in evicted {
            if let Some(session) = self.sessions.get_mut(id) {
                session.revoked_at = Some(now);
            }
        }
        debug!(account_id = %account_id, evicted = evicted.len(), "Evicted oldest sessions");
        evicted.first().copied()
    }

    fn insert_session(&mut self, data: &NewRefreshSession) -> AppResult<RefreshSession> {
        if !self.accounts.contains_key(&data.account_id) {
            return Err(AppError::not_found(format!(
                "Account {} not found",
                data.account_id
            )));
        }
        if self.sessions.values().any(|s| s.token_hash == data.token_hash) {
            return Err(AppError::conflict("Session token collision"));
        }
        self.next_seq += 1;
        let session = RefreshSession {
            id: Uuid::new_v4(),
            account_id: data.account_id,
            token_hash: data.token_hash.clone(),
            token_version: data.token_version,
            expires_at: data.expires_at,
            revoked_at: None,
            created_at: Utc::now(),
            seq: self.next_seq,
        };
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    fn has_active_subscription(&self, tenant_id: Uuid, except: Option<Uuid>) -> bool {
        self.subscriptions.values().any(|s| {
            s.tenant_id == tenant_id
                && s.status == SubscriptionStatus::Active
                && Some(s.id) != except
        })
    }
}

/// In-memory implementation of every storage trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<InnerState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions in any state.
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    /// Overwrite a session's expiry. Used to simulate the passage of time.
    pub async fn set_session_expiry(&self, session_id: Uuid, expires_at: DateTime<Utc>) -> bool {
        let mut state = self.state.lock().await;
        match state.sessions.get_mut(&session_id) {
            Some(session) => {
                session.expires_at = expires_at;
                true
            }
            None => false,
        }
    }

    /// Overwrite a subscription's expiry. Used to simulate the passage of time.
    pub async fn set_subscription_expiry(
        &self,
        subscription_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> bool {
        let mut state = self.state.lock().await;
        match state.subscriptions.get_mut(&subscription_id) {
            Some(subscription) => {
                subscription.expires_at = expires_at;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_with_tenant_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<AccountWithTenant>> {
        let email = normalize_email(email);
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.email == email)
            .map(|a| state.with_tenant(a)))
    }

    async fn find_with_tenant_by_id(&self, id: Uuid) -> AppResult<Option<AccountWithTenant>> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(&id).map(|a| state.with_tenant(a)))
    }

    async fn create_account(&self, data: &CreateAccount) -> AppResult<Account> {
        if data.role.requires_tenant() && data.tenant_id.is_none() {
            return Err(AppError::validation(
                "ADMIN and USER accounts require a tenant",
            ));
        }

        let email = normalize_email(&data.email);
        let mut state = self.state.lock().await;
        if state.accounts.values().any(|a| a.email == email) {
            return Err(AppError::conflict("Email already registered"));
        }
        if let Some(tenant_id) = data.tenant_id {
            if !state.tenants.contains_key(&tenant_id) {
                return Err(AppError::conflict(format!("Tenant {tenant_id} does not exist")));
            }
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email,
            password_hash: data.password_hash.clone(),
            tenant_id: data.tenant_id,
            role: data.role,
            token_version: 1,
            mfa_secret: None,
            active: data.active,
            email_verified_at: data.email_verified_at,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            email_verification_token_hash: None,
            email_verification_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn set_action_token(
        &self,
        account_id: Uuid,
        kind: ActionTokenKind,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let account = state.account_mut(account_id)?;
        let hash = Some(token_hash.to_string());
        match kind {
            ActionTokenKind::PasswordReset => {
                account.password_reset_token_hash = hash;
                account.password_reset_expires_at = Some(expires_at);
            }
            ActionTokenKind::EmailVerification => {
                account.email_verification_token_hash = hash;
                account.email_verification_expires_at = Some(expires_at);
            }
        }
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn find_by_action_token(
        &self,
        kind: ActionTokenKind,
        token_hash: &str,
    ) -> AppResult<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.action_token(kind).is_some_and(|(hash, _)| hash == token_hash))
            .cloned())
    }

    async fn complete_password_reset(
        &self,
        account_id: Uuid,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<i32>> {
        let mut state = self.state.lock().await;
        let Some(account) = state.accounts.get_mut(&account_id) else {
            return Ok(None);
        };
        if !account.has_valid_action_token(ActionTokenKind::PasswordReset, token_hash, now) {
            return Ok(None);
        }
        account.password_hash = new_password_hash.to_string();
        account.password_reset_token_hash = None;
        account.password_reset_expires_at = None;
        account.token_version += 1;
        account.updated_at = Utc::now();
        Ok(Some(account.token_version))
    }

    async fn complete_email_verification(
        &self,
        account_id: Uuid,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(account) = state.accounts.get_mut(&account_id) else {
            return Ok(false);
        };
        if !account.has_valid_action_token(ActionTokenKind::EmailVerification, token_hash, now) {
            return Ok(false);
        }
        account.email_verified_at = Some(now);
        account.active = true;
        account.email_verification_token_hash = None;
        account.email_verification_expires_at = None;
        account.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_account_active(&self, account_id: Uuid, active: bool) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let account = state.account_mut(account_id)?;
        account.active = active;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn bump_token_version(&self, account_id: Uuid) -> AppResult<i32> {
        let mut state = self.state.lock().await;
        let account = state.account_mut(account_id)?;
        account.token_version += 1;
        account.updated_at = Utc::now();
        Ok(account.token_version)
    }

    async fn delete_account(&self, account_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if state.accounts.remove(&account_id).is_none() {
            return Ok(false);
        }
        state.sessions.retain(|_, s| s.account_id != account_id);
        Ok(true)
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn create_plan(&self, data: &CreatePlan) -> AppResult<Plan> {
        let mut state = self.state.lock().await;
        if state.plans.values().any(|p| p.name == data.name) {
            return Err(AppError::conflict("Plan name already exists"));
        }
        let plan = Plan {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            price_cents: data.price_cents,
            max_users: data.max_users,
            features: data.features.clone(),
            created_at: Utc::now(),
        };
        state.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn find_plan_by_name(&self, name: &str) -> AppResult<Option<Plan>> {
        let state = self.state.lock().await;
        Ok(state.plans.values().find(|p| p.name == name).cloned())
    }

    async fn create_tenant(&self, data: &CreateTenant) -> AppResult<Tenant> {
        let subdomain = data.subdomain.trim().to_lowercase();
        let mut state = self.state.lock().await;
        if state.tenants.values().any(|t| t.subdomain == subdomain) {
            return Err(AppError::conflict("Subdomain already in use"));
        }
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            subdomain,
            plan: data.plan,
            active: true,
            created_at: now,
            updated_at: now,
        };
        state.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> AppResult<Option<Tenant>> {
        let subdomain = subdomain.trim().to_lowercase();
        let state = self.state.lock().await;
        Ok(state
            .tenants
            .values()
            .find(|t| t.subdomain == subdomain)
            .cloned())
    }

    async fn set_tenant_active(&self, tenant_id: Uuid, active: bool) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let tenant = state
            .tenants
            .get_mut(&tenant_id)
            .ok_or_else(|| AppError::not_found(format!("Tenant {tenant_id} not found")))?;
        tenant.active = active;
        tenant.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_tenant(&self, tenant_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let referenced = state
            .accounts
            .values()
            .any(|a| a.tenant_id == Some(tenant_id))
            || state.subscriptions.values().any(|s| s.tenant_id == tenant_id);
        if referenced {
            return Err(AppError::conflict(
                "Tenant is still referenced by accounts or subscriptions",
            ));
        }
        Ok(state.tenants.remove(&tenant_id).is_some())
    }

    async fn delete_plan(&self, plan_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if state.subscriptions.values().any(|s| s.plan_id == plan_id) {
            return Err(AppError::conflict("Plan is still referenced by subscriptions"));
        }
        Ok(state.plans.remove(&plan_id).is_some())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn create_subscription(&self, data: &CreateSubscription) -> AppResult<Subscription> {
        let mut state = self.state.lock().await;
        if !state.tenants.contains_key(&data.tenant_id) {
            return Err(AppError::conflict(format!(
                "Tenant {} does not exist",
                data.tenant_id
            )));
        }
        if !state.plans.contains_key(&data.plan_id) {
            return Err(AppError::conflict(format!(
                "Plan {} does not exist",
                data.plan_id
            )));
        }
        if state.has_active_subscription(data.tenant_id, None) {
            return Err(AppError::conflict("Tenant already has an active subscription"));
        }
        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            tenant_id: data.tenant_id,
            plan_id: data.plan_id,
            status: SubscriptionStatus::Active,
            started_at: now,
            expires_at: data.expires_at,
            created_at: now,
        };
        state
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn find_current_subscription(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Subscription>> {
        let state = self.state.lock().await;
        Ok(state
            .subscriptions
            .values()
            .find(|s| s.tenant_id == tenant_id && s.is_current(now))
            .cloned())
    }

    async fn set_subscription_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> AppResult<Subscription> {
        let mut state = self.state.lock().await;
        let tenant_id = state
            .subscriptions
            .get(&subscription_id)
            .map(|s| s.tenant_id)
            .ok_or_else(|| {
                AppError::not_found(format!("Subscription {subscription_id} not found"))
            })?;
        if status == SubscriptionStatus::Active
            && state.has_active_subscription(tenant_id, Some(subscription_id))
        {
            return Err(AppError::conflict("Tenant already has an active subscription"));
        }
        let subscription = state
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or_else(|| {
                AppError::not_found(format!("Subscription {subscription_id} not found"))
            })?;
        subscription.status = status;
        Ok(subscription.clone())
    }

    async fn list_subscriptions(&self, tenant_id: Uuid) -> AppResult<Vec<Subscription>> {
        let state = self.state.lock().await;
        let mut subscriptions: Vec<Subscription> = state
            .subscriptions
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect();
        subscriptions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subscriptions)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session_within_limit(
        &self,
        data: &NewRefreshSession,
        limit: u32,
        now: DateTime<Utc>,
    ) -> AppResult<(RefreshSession, Option<Uuid>)> {
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(&data.account_id) {
            return Err(AppError::not_found(format!(
                "Account {} not found",
                data.account_id
            )));
        }
        let keep = (limit as usize).saturating_sub(1);
        let evicted = state.evict_oldest(data.account_id, keep, now);
        let session = state.insert_session(data)?;
        Ok((session, evicted))
    }

    async fn revoke_oldest_beyond_limit(
        &self,
        account_id: Uuid,
        limit: u32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>> {
        let mut state = self.state.lock().await;
        let keep = (limit as usize).saturating_sub(1);
        Ok(state.evict_oldest(account_id, keep, now))
    }

    async fn find_session_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn rotate_session(
        &self,
        current_id: Uuid,
        next: &NewRefreshSession,
    ) -> AppResult<Option<RefreshSession>> {
        let mut state = self.state.lock().await;
        match state.sessions.get(&current_id) {
            Some(current) if current.revoked_at.is_none() => {}
            _ => return Ok(None),
        }
        let session = state.insert_session(next)?;
        if let Some(current) = state.sessions.get_mut(&current_id) {
            current.revoked_at = Some(Utc::now());
        }
        Ok(Some(session))
    }

    async fn list_active_sessions(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RefreshSession>> {
        let state = self.state.lock().await;
        Ok(state
            .active_sessions(account_id, now)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn revoke_session(&self, session_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.sessions.get_mut(&session_id) {
            Some(session) if session.revoked_at.is_none() => {
                session.revoked_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        let mut state = self.state.lock().await;
        let session = state
            .sessions
            .values_mut()
            .find(|s| s.token_hash == token_hash);
        Ok(session.map(|s| {
            s.revoked_at.get_or_insert_with(Utc::now);
            s.clone()
        }))
    }

    async fn revoke_all_for_account(&self, account_id: Uuid) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut revoked = 0;
        for session in state
            .sessions
            .values_mut()
            .filter(|s| s.account_id == account_id && s.revoked_at.is_none())
        {
            session.revoked_at = Some(now);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn sweep_expired_or_revoked(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state
            .sessions
            .retain(|_, s| s.revoked_at.is_none() && s.expires_at > now);
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, event: &CreateAuditEvent) -> AppResult<AuditEvent> {
        let mut state = self.state.lock().await;
        let event = AuditEvent {
            id: Uuid::now_v7(),
            action: event.action,
            account_id: event.account_id,
            tenant_id: event.tenant_id,
            ip: event.ip.clone(),
            user_agent: event.user_agent.clone(),
            created_at: Utc::now(),
        };
        state.audit.push(event.clone());
        Ok(event)
    }

    async fn recent(&self, account_id: Option<Uuid>, limit: i64) -> AppResult<Vec<AuditEvent>> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state
            .audit
            .iter()
            .rev()
            .filter(|e| account_id.is_none() || e.account_id == account_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
