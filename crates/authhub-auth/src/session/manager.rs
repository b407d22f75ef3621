//! Refresh session state machine: creation, rotation, reuse detection and eviction.
//!
//! A session is `active` until it is revoked or passes its expiry. Every
//! refresh secret is single-use: rotating it revokes the row it maps to and
//! inserts a successor carrying the same `token_version`. Presenting a
//! secret whose row is already revoked means the secret leaked, so the
//! whole session set of the account is revoked.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use authhub_core::config::AuthConfig;
use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_database::store::SessionStore;
use authhub_entity::audit::AuditAction;
use authhub_entity::session::{NewRefreshSession, RefreshSession, SessionState};

use crate::audit::{AuditRecorder, ClientContext};
use crate::secret::{REFRESH_SECRET_BYTES, generate_secret, hash_secret};

/// A newly persisted session and the raw secret for it.
///
/// The secret is not recoverable once this value is dropped.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Raw refresh secret for the client.
    pub secret: String,
    /// Stored record.
    pub session: RefreshSession,
    /// Session revoked to make room, if any.
    pub evicted: Option<Uuid>,
}

/// Manages refresh sessions over a [`SessionStore`].
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    audit: AuditRecorder,
    refresh_ttl_seconds: i64,
    session_limit: u32,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .field("session_limit", &self.session_limit)
            .finish()
    }
}

impl SessionManager {
    /// Creates a manager.
    pub fn new(sessions: Arc<dyn SessionStore>, audit: AuditRecorder, config: &AuthConfig) -> Self {
        Self {
            sessions,
            audit,
            refresh_ttl_seconds: i64::try_from(config.refresh_token_ttl_seconds)
                .unwrap_or(i64::MAX / 2),
            session_limit: config.session_limit,
        }
    }

    /// Refresh session lifetime in seconds.
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    /// Maximum concurrent active sessions per account.
    pub fn session_limit(&self) -> u32 {
        self.session_limit
    }

    fn new_session(&self, account_id: Uuid, token_version: i32) -> (String, NewRefreshSession) {
        let secret = generate_secret(REFRESH_SECRET_BYTES);
        let data = NewRefreshSession {
            account_id,
            token_hash: hash_secret(&secret),
            token_version,
            expires_at: Utc::now() + Duration::seconds(self.refresh_ttl_seconds),
        };
        (secret, data)
    }

    /// Creates a session bound to `token_version`, evicting the oldest
    /// active session first if the account is at its limit.
    pub async fn create(&self, account_id: Uuid, token_version: i32) -> AppResult<IssuedSession> {
        let (secret, data) = self.new_session(account_id, token_version);
        let (session, evicted) = self
            .sessions
            .insert_session_within_limit(&data, self.session_limit, Utc::now())
            .await?;

        if let Some(evicted_id) = evicted {
            info!(
                account_id = %account_id,
                evicted_session = %evicted_id,
                limit = self.session_limit,
                "Session limit reached, evicted oldest session"
            );
        }

        Ok(IssuedSession {
            secret,
            session,
            evicted,
        })
    }

    /// Revokes the oldest active session if the account holds `limit` or more.
    pub async fn enforce_session_limit(&self, account_id: Uuid, limit: u32) -> AppResult<Option<Uuid>> {
        self.sessions
            .revoke_oldest_beyond_limit(account_id, limit, Utc::now())
            .await
    }

    /// Exchanges a refresh secret for a new one.
    ///
    /// Fails with a session error when the secret is unknown or expired.
    /// A revoked secret, or one that loses a concurrent rotation, revokes
    /// every session of the account and records `TOKEN_REUSE_DETECTED`.
    pub async fn rotate(&self, raw_secret: &str, ctx: &ClientContext) -> AppResult<IssuedSession> {
        let current = self
            .sessions
            .find_session_by_hash(&hash_secret(raw_secret))
            .await?
            .ok_or_else(AppError::unauthorized_session)?;

        match current.state_at(Utc::now()) {
            SessionState::Revoked => return Err(self.reuse_detected(&current, ctx).await),
            SessionState::Expired => return Err(AppError::unauthorized_session()),
            SessionState::Active => {}
        }

        let (secret, next) = self.new_session(current.account_id, current.token_version);
        match self.sessions.rotate_session(current.id, &next).await? {
            Some(session) => Ok(IssuedSession {
                secret,
                session,
                evicted: None,
            }),
            None => Err(self.reuse_detected(&current, ctx).await),
        }
    }

    async fn reuse_detected(&self, session: &RefreshSession, ctx: &ClientContext) -> AppError {
        let revoked = match self.sessions.revoke_all_for_account(session.account_id).await {
            Ok(count) => count,
            Err(e) => {
                warn!(account_id = %session.account_id, error = %e, "Failed to revoke sessions after reuse");
                0
            }
        };
        warn!(
            account_id = %session.account_id,
            session_id = %session.id,
            revoked = revoked,
            ip = %ctx.ip,
            "Refresh token reuse detected, revoked all sessions"
        );
        self.audit
            .record(
                AuditAction::TokenReuseDetected,
                Some(session.account_id),
                None,
                ctx,
            )
            .await;
        AppError::unauthorized_session()
    }

    /// Revokes one session by id.
    pub async fn revoke(&self, session_id: Uuid) -> AppResult<bool> {
        self.sessions.revoke_session(session_id).await
    }

    /// Revokes every session of an account.
    pub async fn revoke_all(&self, account_id: Uuid) -> AppResult<u64> {
        self.sessions.revoke_all_for_account(account_id).await
    }

    /// Revokes the session stored under `token_hash`. Idempotent.
    pub async fn revoke_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        self.sessions.revoke_by_hash(token_hash).await
    }

    /// Active sessions of an account, oldest first.
    pub async fn list_active(&self, account_id: Uuid) -> AppResult<Vec<RefreshSession>> {
        self.sessions.list_active_sessions(account_id, Utc::now()).await
    }
}
