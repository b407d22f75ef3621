//! Password reset and email verification.
//!
//! Both flows share one pattern: a random secret is sent to the account's
//! address, only its SHA-256 is stored in a kind-specific slot, and
//! presenting the secret consumes the slot exactly once.

use chrono::{Duration, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use authhub_auth::audit::ClientContext;
use authhub_auth::secret::{ACTION_SECRET_BYTES, generate_secret, hash_secret};
use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_entity::account::{Account, ActionTokenKind};
use authhub_entity::audit::AuditAction;

use super::service::AuthEngine;
use crate::notifier::Notification;

const INVALID_TOKEN: &str = "Invalid or expired token";

impl AuthEngine {
    /// Starts a password reset.
    ///
    /// Never reveals whether `email` is registered: lookup and storage
    /// failures are logged, not returned.
    pub async fn forgot_password(&self, email: &str) {
        match self.accounts.find_with_tenant_by_email(email).await {
            Ok(Some(subject)) => {
                if let Err(e) = self.send_reset(&subject.account).await {
                    error!(account_id = %subject.account.id, error = %e, "Failed to start password reset");
                }
            }
            Ok(None) => debug!("Password reset requested for unknown email"),
            Err(e) => error!(error = %e, "Password reset lookup failed"),
        }
    }

    async fn send_reset(&self, account: &Account) -> AppResult<()> {
        let secret = generate_secret(ACTION_SECRET_BYTES);
        let expires_at = Utc::now() + seconds(self.config.password_reset_ttl_seconds);
        self.accounts
            .set_action_token(
                account.id,
                ActionTokenKind::PasswordReset,
                &hash_secret(&secret),
                expires_at,
            )
            .await?;

        self.notifier.dispatch(Notification::PasswordReset {
            email: account.email.clone(),
            token: secret,
            expires_at,
        });
        info!(account_id = %account.id, "Password reset issued");
        Ok(())
    }

    /// Completes a password reset.
    ///
    /// Replaces the password and bumps `token_version`, which kills every
    /// refresh session issued before the reset.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
        ctx: &ClientContext,
    ) -> AppResult<()> {
        self.validator.validate(new_password, &[])?;

        let token_hash = hash_secret(raw_token);
        let now = Utc::now();
        let account = self
            .accounts
            .find_by_action_token(ActionTokenKind::PasswordReset, &token_hash)
            .await?
            .filter(|a| a.has_valid_action_token(ActionTokenKind::PasswordReset, &token_hash, now))
            .ok_or_else(|| AppError::validation(INVALID_TOKEN))?;

        self.validator.validate(new_password, &[&account.email])?;
        let password_hash = self.hasher.hash_password(new_password).await?;

        let token_version = self
            .accounts
            .complete_password_reset(account.id, &token_hash, &password_hash, now)
            .await?
            .ok_or_else(|| AppError::validation(INVALID_TOKEN))?;

        self.audit
            .record(AuditAction::PasswordReset, Some(account.id), account.tenant_id, ctx)
            .await;
        info!(account_id = %account.id, token_version, "Password reset completed");
        Ok(())
    }

    /// Confirms an email address and activates the account.
    pub async fn verify_email(&self, raw_token: &str, ctx: &ClientContext) -> AppResult<()> {
        let token_hash = hash_secret(raw_token);
        let now = Utc::now();
        let account = self
            .accounts
            .find_by_action_token(ActionTokenKind::EmailVerification, &token_hash)
            .await?
            .filter(|a| {
                a.has_valid_action_token(ActionTokenKind::EmailVerification, &token_hash, now)
            })
            .ok_or_else(|| AppError::validation(INVALID_TOKEN))?;

        if !self
            .accounts
            .complete_email_verification(account.id, &token_hash, now)
            .await?
        {
            return Err(AppError::validation(INVALID_TOKEN));
        }

        self.audit
            .record(AuditAction::EmailVerified, Some(account.id), account.tenant_id, ctx)
            .await;
        info!(account_id = %account.id, "Email verified");
        Ok(())
    }

    /// Sends a fresh verification link, replacing any outstanding one.
    pub async fn issue_email_verification(&self, account_id: Uuid) -> AppResult<()> {
        let subject = self
            .accounts
            .find_with_tenant_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))?;

        let secret = generate_secret(ACTION_SECRET_BYTES);
        let expires_at = Utc::now() + seconds(self.config.email_verification_ttl_seconds);
        self.accounts
            .set_action_token(
                account_id,
                ActionTokenKind::EmailVerification,
                &hash_secret(&secret),
                expires_at,
            )
            .await?;

        self.notifier.dispatch(Notification::EmailVerification {
            email: subject.account.email,
            token: secret,
            expires_at,
        });
        info!(account_id = %account_id, "Email verification issued");
        Ok(())
    }
}

fn seconds(value: u64) -> Duration {
    Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX / 1000))
}
