//! Best-effort audit trail recording.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use authhub_database::store::AuditStore;
use authhub_entity::audit::{AuditAction, CreateAuditEvent};

/// Client attributes recorded with every audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    /// Client IP address.
    pub ip: String,
    /// Client user agent.
    pub user_agent: String,
}

impl ClientContext {
    /// Creates a context.
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
        }
    }
}

impl Default for ClientContext {
    fn default() -> Self {
        Self::new("unknown", "unknown")
    }
}

/// Appends events to the audit store.
///
/// A failed write is logged and swallowed: recording must never change
/// the outcome of the flow being recorded.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl std::fmt::Debug for AuditRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRecorder").finish()
    }
}

impl AuditRecorder {
    /// Creates a recorder over `store`.
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Records one event.
    pub async fn record(
        &self,
        action: AuditAction,
        account_id: Option<Uuid>,
        tenant_id: Option<Uuid>,
        ctx: &ClientContext,
    ) {
        let event = CreateAuditEvent::new(action, account_id, tenant_id, &ctx.ip, &ctx.user_agent);
        match self.store.append(&event).await {
            Ok(_) => debug!(action = %action, account_id = ?account_id, "Audit event recorded"),
            Err(e) => warn!(
                action = %action,
                account_id = ?account_id,
                error = %e,
                "Failed to record audit event"
            ),
        }
    }
}
