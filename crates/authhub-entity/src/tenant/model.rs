//! Tenant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::tier::PlanTier;

/// A customer organization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    /// Unique tenant identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Unique subdomain under the root domain.
    pub subdomain: String,
    /// Commercial tier, stamped into issued tokens.
    pub plan: PlanTier,
    /// Whether accounts of this tenant may log in.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    /// Display name.
    pub name: String,
    /// Subdomain. Normalized to lowercase by the store.
    pub subdomain: String,
    /// Tier.
    pub plan: PlanTier,
}
