//! Account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::AccountRole;
use super::token::ActionTokenKind;
use crate::tenant::Tenant;

/// A login identity.
///
/// `token_version` only ever increases; every refresh session remembers the
/// value it was issued under and dies once the account moves past it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Unique account identifier.
    pub id: Uuid,
    /// Lowercased, trimmed email address (unique).
    pub email: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Owning tenant. `None` for platform super-administrators.
    pub tenant_id: Option<Uuid>,
    /// Account role.
    pub role: AccountRole,
    /// Session generation counter.
    pub token_version: i32,
    /// Reserved for multi-factor authentication. Never read.
    #[serde(skip_serializing)]
    pub mfa_secret: Option<String>,
    /// Whether the account may log in.
    pub active: bool,
    /// When the email address was confirmed.
    pub email_verified_at: Option<DateTime<Utc>>,
    /// SHA-256 of the outstanding password reset token.
    #[serde(skip_serializing)]
    pub password_reset_token_hash: Option<String>,
    /// Expiry of the password reset token.
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    /// SHA-256 of the outstanding email verification token.
    #[serde(skip_serializing)]
    pub email_verification_token_hash: Option<String>,
    /// Expiry of the email verification token.
    pub email_verification_expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Platform-level accounts carry no tenant.
    pub fn is_super_admin(&self) -> bool {
        self.tenant_id.is_none()
    }

    /// Check whether the email address has been confirmed.
    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// Stored hash and expiry for the given token kind.
    pub fn action_token(&self, kind: ActionTokenKind) -> Option<(&str, DateTime<Utc>)> {
        let (hash, expires) = match kind {
            ActionTokenKind::PasswordReset => (
                self.password_reset_token_hash.as_deref(),
                self.password_reset_expires_at,
            ),
            ActionTokenKind::EmailVerification => (
                self.email_verification_token_hash.as_deref(),
                self.email_verification_expires_at,
            ),
        };
        hash.zip(expires)
    }

    /// Whether `hash` matches an unexpired token of the given kind.
    pub fn has_valid_action_token(
        &self,
        kind: ActionTokenKind,
        hash: &str,
        now: DateTime<Utc>,
    ) -> bool {
        self.action_token(kind)
            .is_some_and(|(stored, expires)| stored == hash && expires > now)
    }
}

/// Data required to create a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    /// Email address. Normalized by the store.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Owning tenant.
    pub tenant_id: Option<Uuid>,
    /// Role.
    pub role: AccountRole,
    /// Initial activation flag.
    pub active: bool,
    /// Pre-verified timestamp (seeded operators only).
    pub email_verified_at: Option<DateTime<Utc>>,
}

/// An account together with its tenant, fetched as one consistent read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountWithTenant {
    /// The account.
    pub account: Account,
    /// Its tenant, if bound to one.
    pub tenant: Option<Tenant>,
}

impl AccountWithTenant {
    /// Whether the owning tenant (if any) is active.
    ///
    /// A tenant-bound account whose tenant row could not be loaded is
    /// treated as inactive.
    pub fn tenant_active(&self) -> bool {
        match (self.account.tenant_id, &self.tenant) {
            (None, _) => true,
            (Some(_), Some(tenant)) => tenant.active,
            (Some(_), None) => false,
        }
    }
}

/// Normalizes an email address for lookup and storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
