//! Subscription entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::SubscriptionStatus;

/// A tenant's entitlement to a plan over a time range.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    /// Unique subscription identifier.
    pub id: Uuid,
    /// Subscribing tenant.
    pub tenant_id: Uuid,
    /// Subscribed plan.
    pub plan_id: Uuid,
    /// Current status.
    pub status: SubscriptionStatus,
    /// Start of the entitlement.
    pub started_at: DateTime<Utc>,
    /// End of the entitlement.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Active and unexpired at `now`.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.expires_at > now
    }
}

/// Data required to open a new active subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscription {
    /// Subscribing tenant.
    pub tenant_id: Uuid,
    /// Subscribed plan.
    pub plan_id: Uuid,
    /// End of the entitlement.
    pub expires_at: DateTime<Utc>,
}
