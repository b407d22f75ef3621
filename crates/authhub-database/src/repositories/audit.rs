//! Audit event repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use authhub_core::result::AppResult;
use authhub_entity::audit::{AuditEvent, CreateAuditEvent};

use super::db_error;
use crate::store::AuditStore;

/// Append-only repository for audit events.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    /// Create a new audit repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn append(&self, event: &CreateAuditEvent) -> AppResult<AuditEvent> {
        sqlx::query_as::<_, AuditEvent>(
            "INSERT INTO audit_events (id, action, account_id, tenant_id, ip, user_agent) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(event.action)
        .bind(event.account_id)
        .bind(event.tenant_id)
        .bind(&event.ip)
        .bind(&event.user_agent)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to append audit event"))
    }

    async fn recent(&self, account_id: Option<Uuid>, limit: i64) -> AppResult<Vec<AuditEvent>> {
        sqlx::query_as::<_, AuditEvent>(
            "SELECT * FROM audit_events \
             WHERE ($1::uuid IS NULL OR account_id = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list audit events"))
    }
}
