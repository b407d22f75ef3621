//! Plan entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A purchasable plan referenced by subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    /// Unique plan identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Price in cents.
    pub price_cents: i64,
    /// Seat cap.
    pub max_users: i32,
    /// Feature flags.
    pub features: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlan {
    /// Display name.
    pub name: String,
    /// Price in cents.
    pub price_cents: i64,
    /// Seat cap.
    pub max_users: i32,
    /// Feature flags.
    pub features: serde_json::Value,
}
