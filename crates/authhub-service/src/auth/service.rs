//! Login, refresh and logout orchestration.

use std::sync::Arc;

use tracing::{error, info, warn};

use authhub_auth::audit::{AuditRecorder, ClientContext};
use authhub_auth::jwt::{AccessClaims, SigningKeys, TokenIssuer};
use authhub_auth::license::LicenseGate;
use authhub_auth::password::{PasswordHasher, PasswordValidator};
use authhub_auth::redirect::resolve_redirect;
use authhub_auth::secret::hash_secret;
use authhub_auth::session::{IssuedSession, SessionManager};
use authhub_core::config::AuthConfig;
use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_database::store::{AccountStore, CredentialStore};
use authhub_entity::account::AccountWithTenant;
use authhub_entity::audit::AuditAction;

use super::types::{LoginOutcome, LoginRequest, LogoutOutcome, TokenPair};
use crate::notifier::NotificationDispatcher;

/// Orchestrates the authentication flows.
///
/// Every rejection is recorded in the audit trail with its true cause,
/// while the caller only ever sees a coarse error.
#[derive(Clone)]
pub struct AuthEngine {
    pub(super) accounts: Arc<dyn AccountStore>,
    pub(super) issuer: Arc<TokenIssuer>,
    pub(super) sessions: SessionManager,
    pub(super) license: LicenseGate,
    pub(super) audit: AuditRecorder,
    pub(super) hasher: PasswordHasher,
    pub(super) validator: PasswordValidator,
    pub(super) notifier: NotificationDispatcher,
    pub(super) config: AuthConfig,
}

impl std::fmt::Debug for AuthEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEngine")
            .field("issuer", &self.config.issuer)
            .field("allowed_audiences", &self.config.allowed_audiences)
            .finish()
    }
}

impl AuthEngine {
    /// Wires the engine from its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        issuer: Arc<TokenIssuer>,
        sessions: SessionManager,
        license: LicenseGate,
        audit: AuditRecorder,
        hasher: PasswordHasher,
        notifier: NotificationDispatcher,
        config: AuthConfig,
    ) -> Self {
        Self {
            accounts,
            issuer,
            sessions,
            license,
            audit,
            hasher,
            validator: PasswordValidator::new(&config),
            notifier,
            config,
        }
    }

    /// Wires the engine over one credential store.
    pub fn from_store(
        store: &CredentialStore,
        keys: Arc<SigningKeys>,
        notifier: NotificationDispatcher,
        config: &AuthConfig,
    ) -> AppResult<Self> {
        let audit = AuditRecorder::new(Arc::clone(&store.audit));
        let sessions = SessionManager::new(Arc::clone(&store.sessions), audit.clone(), config);
        Ok(Self::new(
            Arc::clone(&store.accounts),
            Arc::new(TokenIssuer::new(keys, config)),
            sessions,
            LicenseGate::new(Arc::clone(&store.subscriptions)),
            audit,
            PasswordHasher::new(config)?,
            notifier,
            config.clone(),
        ))
    }

    /// The password hasher.
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// The token issuer, for publishing the key set.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// The session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Authenticates credentials and issues a token pair.
    ///
    /// Unknown account, wrong password, unverified email, inactive account
    /// or tenant and missing license all fail with the same
    /// `invalid_credentials` error. A disallowed audience fails with an
    /// authorization error once the password has been checked.
    pub async fn login(&self, request: &LoginRequest, ctx: &ClientContext) -> AppResult<LoginOutcome> {
        let Some(subject) = self.accounts.find_with_tenant_by_email(&request.email).await? else {
            self.hasher.verify_dummy(&request.password).await;
            self.audit.record(AuditAction::LoginFailed, None, None, ctx).await;
            return Err(AppError::invalid_credentials());
        };
        let account = &subject.account;
        let (account_id, tenant_id) = (Some(account.id), account.tenant_id);

        if !self
            .hasher
            .verify_password(&request.password, &account.password_hash)
            .await?
        {
            self.audit.record(AuditAction::LoginFailed, account_id, tenant_id, ctx).await;
            return Err(AppError::invalid_credentials());
        }

        if !account.is_email_verified() {
            self.audit
                .record(AuditAction::LoginBlockedEmailNotVerified, account_id, tenant_id, ctx)
                .await;
            return Err(AppError::invalid_credentials());
        }

        if !self.config.is_allowed_audience(&request.audience) {
            self.audit.record(AuditAction::LoginFailed, account_id, tenant_id, ctx).await;
            return Err(AppError::authorization("Application not authorized"));
        }

        if !account.active || !subject.tenant_active() {
            self.audit.record(AuditAction::LoginFailed, account_id, tenant_id, ctx).await;
            return Err(AppError::invalid_credentials());
        }

        if !self.license.is_licensed(account).await {
            self.audit.record(AuditAction::LicenseExpired, account_id, tenant_id, ctx).await;
            return Err(AppError::invalid_credentials());
        }

        let access = self
            .issuer
            .issue_access(AccessClaims::for_account(&subject, &request.audience))?;
        let session = self.sessions.create(account.id, account.token_version).await?;

        self.audit.record(AuditAction::LoginSuccess, account_id, tenant_id, ctx).await;
        info!(account_id = %account.id, audience = %request.audience, "Login succeeded");

        let redirect = resolve_redirect(
            request.redirect.as_deref(),
            &self.config.root_domain,
            &self.config.default_redirect(),
        );

        Ok(LoginOutcome {
            tokens: TokenPair {
                access_token: access.token,
                access_expires_at: access.expires_at,
                refresh_token: session.secret,
                refresh_expires_at: session.session.expires_at,
            },
            redirect,
        })
    }

    /// Rotates the refresh secret and reissues both tokens.
    ///
    /// After rotation the account is re-read and must still carry the
    /// `token_version` the session lineage was issued under, be active,
    /// belong to an active tenant and hold a license. If any of these fail
    /// the freshly rotated session is revoked before rejecting.
    pub async fn refresh(&self, raw_secret: Option<&str>, ctx: &ClientContext) -> AppResult<TokenPair> {
        let raw_secret = raw_secret
            .filter(|s| !s.is_empty())
            .ok_or_else(AppError::unauthorized_session)?;
        let issued = self.sessions.rotate(raw_secret, ctx).await?;

        let subject = match self.revalidate(&issued, ctx).await {
            Ok(subject) => subject,
            Err(e) => {
                if let Err(revoke_err) = self.sessions.revoke(issued.session.id).await {
                    error!(
                        session_id = %issued.session.id,
                        error = %revoke_err,
                        "Failed to revoke session after failed revalidation"
                    );
                }
                return Err(e);
            }
        };

        let audience = self.config.refresh_audience();
        let access = self
            .issuer
            .issue_access(AccessClaims::for_account(&subject, audience))?;

        self.audit
            .record(
                AuditAction::TokenRefreshed,
                Some(subject.account.id),
                subject.account.tenant_id,
                ctx,
            )
            .await;

        Ok(TokenPair {
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token: issued.secret,
            refresh_expires_at: issued.session.expires_at,
        })
    }

    async fn revalidate(&self, issued: &IssuedSession, ctx: &ClientContext) -> AppResult<AccountWithTenant> {
        let subject = self
            .accounts
            .find_with_tenant_by_id(issued.session.account_id)
            .await?
            .ok_or_else(AppError::unauthorized_session)?;
        let account = &subject.account;

        if account.token_version != issued.session.token_version {
            warn!(account_id = %account.id, "Refresh rejected: token version changed");
            return Err(AppError::unauthorized_session());
        }

        if !account.active || !subject.tenant_active() {
            return Err(AppError::unauthorized_session());
        }

        if !self.license.is_licensed(account).await {
            self.audit
                .record(AuditAction::LicenseExpired, Some(account.id), account.tenant_id, ctx)
                .await;
            return Err(AppError::license("License expired"));
        }

        Ok(subject)
    }

    /// Revokes the session behind `raw_secret`, if any.
    ///
    /// Idempotent: an absent or already revoked session is not an error.
    pub async fn logout(&self, raw_secret: Option<&str>, ctx: &ClientContext) -> AppResult<LogoutOutcome> {
        let session = match raw_secret.filter(|s| !s.is_empty()) {
            Some(secret) => self.sessions.revoke_by_hash(&hash_secret(secret)).await?,
            None => None,
        };

        self.audit
            .record(AuditAction::Logout, session.as_ref().map(|s| s.account_id), None, ctx)
            .await;

        Ok(LogoutOutcome {
            session_found: session.is_some(),
        })
    }
}
