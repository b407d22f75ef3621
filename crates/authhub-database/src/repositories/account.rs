//! Account repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_entity::account::model::normalize_email;
use authhub_entity::account::{Account, AccountWithTenant, ActionTokenKind, CreateAccount};
use authhub_entity::tenant::{PlanTier, Tenant};

use super::{db_error, map_write_error};
use crate::store::AccountStore;

const ACCOUNT_WITH_TENANT: &str = "SELECT a.*, \
     t.id AS t_id, t.name AS t_name, t.subdomain AS t_subdomain, t.plan AS t_plan, \
     t.active AS t_active, t.created_at AS t_created_at, t.updated_at AS t_updated_at \
     FROM accounts a LEFT JOIN tenants t ON t.id = a.tenant_id";

/// Joined row of an account and its (optional) tenant.
#[derive(Debug, FromRow)]
struct AccountTenantRow {
    #[sqlx(flatten)]
    account: Account,
    t_id: Option<Uuid>,
    t_name: Option<String>,
    t_subdomain: Option<String>,
    t_plan: Option<PlanTier>,
    t_active: Option<bool>,
    t_created_at: Option<DateTime<Utc>>,
    t_updated_at: Option<DateTime<Utc>>,
}

impl From<AccountTenantRow> for AccountWithTenant {
    fn from(row: AccountTenantRow) -> Self {
        let tenant = match (
            row.t_id,
            row.t_name,
            row.t_subdomain,
            row.t_plan,
            row.t_active,
            row.t_created_at,
            row.t_updated_at,
        ) {
            (
                Some(id),
                Some(name),
                Some(subdomain),
                Some(plan),
                Some(active),
                Some(created_at),
                Some(updated_at),
            ) => Some(Tenant {
                id,
                name,
                subdomain,
                plan,
                active,
                created_at,
                updated_at,
            }),
            _ => None,
        };
        Self {
            account: row.account,
            tenant,
        }
    }
}

/// Column pair holding the token slot for `kind`.
fn token_columns(kind: ActionTokenKind) -> (&'static str, &'static str) {
    match kind {
        ActionTokenKind::PasswordReset => {
            ("password_reset_token_hash", "password_reset_expires_at")
        }
        ActionTokenKind::EmailVerification => (
            "email_verification_token_hash",
            "email_verification_expires_at",
        ),
    }
}

/// Repository for account persistence.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new account repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn find_with_tenant_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<AccountWithTenant>> {
        sqlx::query_as::<_, AccountTenantRow>(&format!("{ACCOUNT_WITH_TENANT} WHERE a.email = $1"))
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(AccountWithTenant::from))
            .map_err(db_error("Failed to find account by email"))
    }

    async fn find_with_tenant_by_id(&self, id: Uuid) -> AppResult<Option<AccountWithTenant>> {
        sqlx::query_as::<_, AccountTenantRow>(&format!("{ACCOUNT_WITH_TENANT} WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(AccountWithTenant::from))
            .map_err(db_error("Failed to find account"))
    }

    async fn create_account(&self, data: &CreateAccount) -> AppResult<Account> {
        if data.role.requires_tenant() && data.tenant_id.is_none() {
            return Err(AppError::validation(
                "ADMIN and USER accounts require a tenant",
            ));
        }

        sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, email, password_hash, tenant_id, role, active, email_verified_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(normalize_email(&data.email))
        .bind(&data.password_hash)
        .bind(data.tenant_id)
        .bind(data.role)
        .bind(data.active)
        .bind(data.email_verified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Email already registered", "Failed to create account"))
    }

    async fn set_action_token(
        &self,
        account_id: Uuid,
        kind: ActionTokenKind,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let (hash_col, expires_col) = token_columns(kind);
        sqlx::query(&format!(
            "UPDATE accounts SET {hash_col} = $2, {expires_col} = $3, updated_at = NOW() WHERE id = $1"
        ))
        .bind(account_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to store account token"))?;
        Ok(())
    }

    async fn find_by_action_token(
        &self,
        kind: ActionTokenKind,
        token_hash: &str,
    ) -> AppResult<Option<Account>> {
        let (hash_col, _) = token_columns(kind);
        sqlx::query_as::<_, Account>(&format!("SELECT * FROM accounts WHERE {hash_col} = $1"))
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find account by token"))
    }

    async fn complete_password_reset(
        &self,
        account_id: Uuid,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<i32>> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE accounts SET password_hash = $3, \
                 password_reset_token_hash = NULL, password_reset_expires_at = NULL, \
                 token_version = token_version + 1, updated_at = NOW() \
             WHERE id = $1 AND password_reset_token_hash = $2 AND password_reset_expires_at > $4 \
             RETURNING token_version",
        )
        .bind(account_id)
        .bind(token_hash)
        .bind(new_password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to reset password"))
    }

    async fn complete_email_verification(
        &self,
        account_id: Uuid,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET email_verified_at = $3, active = TRUE, \
                 email_verification_token_hash = NULL, email_verification_expires_at = NULL, \
                 updated_at = NOW() \
             WHERE id = $1 AND email_verification_token_hash = $2 \
               AND email_verification_expires_at > $3",
        )
        .bind(account_id)
        .bind(token_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to verify email"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_account_active(&self, account_id: Uuid, active: bool) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE accounts SET active = $2, updated_at = NOW() WHERE id = $1")
                .bind(account_id)
                .bind(active)
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to update account"))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Account {account_id} not found")));
        }
        Ok(())
    }

    async fn bump_token_version(&self, account_id: Uuid) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE accounts SET token_version = token_version + 1, updated_at = NOW() \
             WHERE id = $1 RETURNING token_version",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to bump token version"))?
        .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))
    }

    async fn delete_account(&self, account_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete account"))?;
        Ok(result.rows_affected() > 0)
    }
}
