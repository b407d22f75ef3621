//! Audit event entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::action::AuditAction;

/// Maximum stored length of a client IP (IPv6 text form).
pub const MAX_IP_LEN: usize = 45;
/// Maximum stored length of a user agent.
pub const MAX_USER_AGENT_LEN: usize = 512;

/// An immutable audit record. Rows are only ever inserted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// What happened.
    pub action: AuditAction,
    /// Account involved, when known.
    pub account_id: Option<Uuid>,
    /// Tenant involved, when known.
    pub tenant_id: Option<Uuid>,
    /// Client IP.
    pub ip: String,
    /// Client user agent.
    pub user_agent: String,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// Data required to append an audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditEvent {
    /// What happened.
    pub action: AuditAction,
    /// Account involved.
    pub account_id: Option<Uuid>,
    /// Tenant involved.
    pub tenant_id: Option<Uuid>,
    /// Client IP, truncated to the column width.
    pub ip: String,
    /// Client user agent, truncated to the column width.
    pub user_agent: String,
}

impl CreateAuditEvent {
    /// Builds an event, clamping client strings to their column widths.
    pub fn new(
        action: AuditAction,
        account_id: Option<Uuid>,
        tenant_id: Option<Uuid>,
        ip: &str,
        user_agent: &str,
    ) -> Self {
        Self {
            action,
            account_id,
            tenant_id,
            ip: truncate(ip, MAX_IP_LEN),
            user_agent: truncate(user_agent, MAX_USER_AGENT_LEN),
        }
    }
}

fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
