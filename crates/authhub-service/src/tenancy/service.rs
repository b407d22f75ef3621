//! Administrative provisioning used by the CLI.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use authhub_auth::password::{PasswordHasher, PasswordValidator};
use authhub_core::config::AuthConfig;
use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_database::store::{
    AccountStore, CredentialStore, SessionStore, SubscriptionStore, TenantStore,
};
use authhub_entity::account::{Account, AccountRole, CreateAccount};
use authhub_entity::plan::{CreatePlan, Plan};
use authhub_entity::subscription::{CreateSubscription, Subscription, SubscriptionStatus};
use authhub_entity::tenant::{CreateTenant, PlanTier, Tenant};

use crate::auth::AuthEngine;

/// Name of the plan created by [`TenancyService::seed`].
pub const SEED_PLAN_NAME: &str = "FREE";

/// Lifetime of the platform tenant's seeded subscription.
const SEED_SUBSCRIPTION_YEARS: i64 = 100;

/// Request to provision an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    /// Email address.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Role.
    pub role: AccountRole,
    /// Owning tenant. Required for `ADMIN` and `USER`.
    pub tenant_id: Option<Uuid>,
}

/// Bootstrap parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRequest {
    /// Display name of the platform tenant.
    pub tenant_name: String,
    /// Subdomain of the platform tenant.
    pub tenant_subdomain: String,
    /// Email of the first super-administrator.
    pub admin_email: String,
    /// Password of the first super-administrator.
    pub admin_password: String,
}

/// What [`TenancyService::seed`] found or created.
#[derive(Debug, Clone)]
pub struct SeedOutcome {
    /// The seed plan.
    pub plan: Plan,
    /// The platform tenant.
    pub tenant: Tenant,
    /// The platform tenant's current subscription.
    pub subscription: Subscription,
    /// The super-administrator, if it was created by this run.
    pub admin: Option<Account>,
}

/// Provisions tenancy records.
#[derive(Clone)]
pub struct TenancyService {
    accounts: Arc<dyn AccountStore>,
    tenants: Arc<dyn TenantStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    sessions: Arc<dyn SessionStore>,
    engine: AuthEngine,
    hasher: PasswordHasher,
    validator: PasswordValidator,
}

impl std::fmt::Debug for TenancyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenancyService").finish()
    }
}

impl TenancyService {
    /// Creates the service over `store`.
    ///
    /// `engine` is used to send verification links for new accounts.
    pub fn new(
        store: &CredentialStore,
        engine: AuthEngine,
        hasher: PasswordHasher,
        config: &AuthConfig,
    ) -> Self {
        Self {
            accounts: Arc::clone(&store.accounts),
            tenants: Arc::clone(&store.tenants),
            subscriptions: Arc::clone(&store.subscriptions),
            sessions: Arc::clone(&store.sessions),
            engine,
            hasher,
            validator: PasswordValidator::new(config),
        }
    }

    /// Creates a plan.
    pub async fn create_plan(&self, data: &CreatePlan) -> AppResult<Plan> {
        if data.name.trim().is_empty() {
            return Err(AppError::validation("Plan name must not be empty"));
        }
        if data.price_cents < 0 || data.max_users < 1 {
            return Err(AppError::validation(
                "Price must be non-negative and max users at least 1",
            ));
        }
        let plan = self.tenants.create_plan(data).await?;
        info!(plan_id = %plan.id, name = %plan.name, "Plan created");
        Ok(plan)
    }

    /// Creates a tenant. Fails with `Conflict` on a taken subdomain.
    pub async fn create_tenant(&self, name: &str, subdomain: &str, plan: PlanTier) -> AppResult<Tenant> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Tenant name must not be empty"));
        }
        let subdomain = subdomain.trim().to_lowercase();
        if !is_valid_subdomain(&subdomain) {
            return Err(AppError::validation(format!(
                "Invalid subdomain '{subdomain}': use 1-63 lowercase letters, digits or hyphens"
            )));
        }

        let tenant = self
            .tenants
            .create_tenant(&CreateTenant {
                name: name.trim().to_string(),
                subdomain,
                plan,
            })
            .await?;
        info!(tenant_id = %tenant.id, subdomain = %tenant.subdomain, "Tenant created");
        Ok(tenant)
    }

    /// Looks up a tenant by subdomain.
    pub async fn find_tenant(&self, subdomain: &str) -> AppResult<Tenant> {
        self.tenants
            .find_tenant_by_subdomain(subdomain)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Tenant '{subdomain}' not found")))
    }

    /// Activates or deactivates a tenant. Deactivation blocks login and refresh.
    pub async fn set_tenant_active(&self, tenant_id: Uuid, active: bool) -> AppResult<()> {
        self.tenants.set_tenant_active(tenant_id, active).await?;
        info!(tenant_id = %tenant_id, active, "Tenant status changed");
        Ok(())
    }

    /// Opens an `ACTIVE` subscription for `tenant_id` on the named plan.
    pub async fn create_subscription(
        &self,
        tenant_id: Uuid,
        plan_name: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        if expires_at <= Utc::now() {
            return Err(AppError::validation("Subscription expiry must be in the future"));
        }
        let plan = self
            .tenants
            .find_plan_by_name(plan_name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Plan '{plan_name}' not found")))?;

        let subscription = self
            .subscriptions
            .create_subscription(&CreateSubscription {
                tenant_id,
                plan_id: plan.id,
                expires_at,
            })
            .await?;
        info!(
            subscription_id = %subscription.id,
            tenant_id = %tenant_id,
            plan = %plan.name,
            "Subscription created"
        );
        Ok(subscription)
    }

    /// Moves a subscription to `status`.
    pub async fn set_subscription_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> AppResult<Subscription> {
        let subscription = self
            .subscriptions
            .set_subscription_status(subscription_id, status)
            .await?;
        info!(subscription_id = %subscription_id, status = %status.as_str(), "Subscription status changed");
        Ok(subscription)
    }

    /// All subscriptions of a tenant, newest first.
    pub async fn list_subscriptions(&self, tenant_id: Uuid) -> AppResult<Vec<Subscription>> {
        self.subscriptions.list_subscriptions(tenant_id).await
    }

    /// Provisions an account.
    ///
    /// `ADMIN` and `USER` accounts start inactive and unverified and are sent
    /// a verification link. `SUPERADMIN` accounts start active and verified.
    pub async fn create_account(&self, request: &CreateAccountRequest) -> AppResult<Account> {
        let email = request.email.trim();
        if !is_plausible_email(email) {
            return Err(AppError::validation(format!("Invalid email address '{email}'")));
        }
        if request.role.requires_tenant() && request.tenant_id.is_none() {
            return Err(AppError::validation("ADMIN and USER accounts require a tenant"));
        }
        if !request.role.requires_tenant() && request.tenant_id.is_some() {
            return Err(AppError::validation("SUPERADMIN accounts cannot belong to a tenant"));
        }
        self.validator.validate(&request.password, &[email])?;

        let password_hash = self.hasher.hash_password(&request.password).await?;
        let platform = !request.role.requires_tenant();
        let account = self
            .accounts
            .create_account(&CreateAccount {
                email: email.to_string(),
                password_hash,
                tenant_id: request.tenant_id,
                role: request.role,
                active: platform,
                email_verified_at: platform.then(Utc::now),
            })
            .await?;
        info!(account_id = %account.id, role = %account.role, "Account created");

        if !platform {
            self.engine.issue_email_verification(account.id).await?;
        }
        Ok(account)
    }

    /// Activates or deactivates an account.
    pub async fn set_account_active(&self, account_id: Uuid, active: bool) -> AppResult<()> {
        self.accounts.set_account_active(account_id, active).await?;
        info!(account_id = %account_id, active, "Account status changed");
        Ok(())
    }

    /// Ends every session of an account.
    ///
    /// Bumps `token_version` so unrotated secrets die on their next use and
    /// revokes the stored sessions outright. Returns the new version.
    pub async fn force_logout(&self, account_id: Uuid) -> AppResult<i32> {
        let version = self.accounts.bump_token_version(account_id).await?;
        let revoked = self.sessions.revoke_all_for_account(account_id).await?;
        info!(account_id = %account_id, token_version = version, revoked, "Account sessions invalidated");
        Ok(version)
    }

    /// Bootstraps the platform: a free plan, the platform tenant with a
    /// long-lived subscription and the first super-administrator.
    ///
    /// Safe to re-run; records that already exist are reused.
    pub async fn seed(&self, request: &SeedRequest) -> AppResult<SeedOutcome> {
        let plan = match self.tenants.find_plan_by_name(SEED_PLAN_NAME).await? {
            Some(plan) => plan,
            None => {
                self.create_plan(&CreatePlan {
                    name: SEED_PLAN_NAME.to_string(),
                    price_cents: 0,
                    max_users: 5,
                    features: serde_json::json!({}),
                })
                .await?
            }
        };

        let tenant = match self
            .tenants
            .find_tenant_by_subdomain(&request.tenant_subdomain)
            .await?
        {
            Some(tenant) => tenant,
            None => {
                self.create_tenant(&request.tenant_name, &request.tenant_subdomain, PlanTier::Enterprise)
                    .await?
            }
        };

        let now = Utc::now();
        let subscription = match self.subscriptions.find_current_subscription(tenant.id, now).await? {
            Some(subscription) => subscription,
            None => {
                self.create_subscription(
                    tenant.id,
                    &plan.name,
                    now + Duration::days(365 * SEED_SUBSCRIPTION_YEARS),
                )
                .await?
            }
        };

        let admin = match self
            .accounts
            .find_with_tenant_by_email(&request.admin_email)
            .await?
        {
            Some(_) => None,
            None => Some(
                self.create_account(&CreateAccountRequest {
                    email: request.admin_email.clone(),
                    password: request.admin_password.clone(),
                    role: AccountRole::SuperAdmin,
                    tenant_id: None,
                })
                .await?,
            ),
        };

        info!(tenant = %tenant.subdomain, admin_created = admin.is_some(), "Seed complete");
        Ok(SeedOutcome {
            plan,
            tenant,
            subscription,
            admin,
        })
    }
}

fn is_valid_subdomain(subdomain: &str) -> bool {
    (1..=63).contains(&subdomain.len())
        && !subdomain.starts_with('-')
        && !subdomain.ends_with('-')
        && subdomain
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}
