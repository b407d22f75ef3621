//! Refresh session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_entity::session::{NewRefreshSession, RefreshSession};

use super::{db_error, map_write_error};
use crate::store::SessionStore;

/// Repository for refresh sessions.
///
/// Multi-statement operations run in a transaction that first locks the
/// owning account row, which serializes concurrent logins of one account.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_account(tx: &mut Transaction<'_, Postgres>, account_id: Uuid) -> AppResult<()> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(account_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error("Failed to lock account"))?
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))?;
        Ok(())
    }

    /// Revoke the oldest active sessions so that at most `keep` remain.
    async fn evict_oldest(
        tx: &mut Transaction<'_, Postgres>,
        account_id: Uuid,
        keep: usize,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>> {
        let active: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM refresh_sessions \
             WHERE account_id = $1 AND revoked_at IS NULL AND expires_at > $2 \
             ORDER BY created_at ASC, seq ASC",
        )
        .bind(account_id)
        .bind(now)
        .fetch_all(&mut **tx)
        .await
        .map_err(db_error("Failed to list active sessions"))?;

        if active.len() <= keep {
            return Ok(None);
        }

        let evicted = &active[..active.len() - keep];
        sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = $2 \
             WHERE id = ANY($1) AND revoked_at IS NULL",
        )
        .bind(evicted)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(db_error("Failed to evict session"))?;

        debug!(account_id = %account_id, evicted = evicted.len(), "Evicted oldest sessions");
        Ok(evicted.first().copied())
    }

    async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        data: &NewRefreshSession,
    ) -> AppResult<RefreshSession> {
        sqlx::query_as::<_, RefreshSession>(
            "INSERT INTO refresh_sessions (id, account_id, token_hash, token_version, expires_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.account_id)
        .bind(&data.token_hash)
        .bind(data.token_version)
        .bind(data.expires_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, "Session token collision", "Failed to create session"))
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn insert_session_within_limit(
        &self,
        data: &NewRefreshSession,
        limit: u32,
        now: DateTime<Utc>,
    ) -> AppResult<(RefreshSession, Option<Uuid>)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        Self::lock_account(&mut tx, data.account_id).await?;
        let keep = (limit as usize).saturating_sub(1);
        let evicted = Self::evict_oldest(&mut tx, data.account_id, keep, now).await?;
        let session = Self::insert(&mut tx, data).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit session"))?;
        Ok((session, evicted))
    }

    async fn revoke_oldest_beyond_limit(
        &self,
        account_id: Uuid,
        limit: u32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        Self::lock_account(&mut tx, account_id).await?;
        let keep = (limit as usize).saturating_sub(1);
        let evicted = Self::evict_oldest(&mut tx, account_id, keep, now).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit eviction"))?;
        Ok(evicted)
    }

    async fn find_session_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        sqlx::query_as::<_, RefreshSession>("SELECT * FROM refresh_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find session"))
    }

    async fn rotate_session(
        &self,
        current_id: Uuid,
        next: &NewRefreshSession,
    ) -> AppResult<Option<RefreshSession>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let revoked = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW() \
             WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(current_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to revoke session"))?;

        if revoked.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(db_error("Failed to roll back rotation"))?;
            return Ok(None);
        }

        let session = Self::insert(&mut tx, next).await?;
        tx.commit()
            .await
            .map_err(db_error("Failed to commit rotation"))?;
        Ok(Some(session))
    }

    async fn list_active_sessions(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RefreshSession>> {
        sqlx::query_as::<_, RefreshSession>(
            "SELECT * FROM refresh_sessions \
             WHERE account_id = $1 AND revoked_at IS NULL AND expires_at > $2 \
             ORDER BY created_at ASC, seq ASC",
        )
        .bind(account_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list sessions"))
    }

    async fn revoke_session(&self, session_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to revoke session"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        sqlx::query_as::<_, RefreshSession>(
            "UPDATE refresh_sessions SET revoked_at = COALESCE(revoked_at, NOW()) \
             WHERE token_hash = $1 RETURNING *",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to revoke session"))
    }

    async fn revoke_all_for_account(&self, account_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW() \
             WHERE account_id = $1 AND revoked_at IS NULL",
        )
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to revoke sessions"))?;
        Ok(result.rows_affected())
    }

    async fn sweep_expired_or_revoked(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM refresh_sessions WHERE revoked_at IS NOT NULL OR expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to sweep sessions"))?;
        Ok(result.rows_affected())
    }
}
