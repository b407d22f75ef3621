//! Subscription repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_entity::subscription::{CreateSubscription, Subscription, SubscriptionStatus};

use super::{db_error, map_write_error};
use crate::store::SubscriptionStore;

/// Repository for tenant subscriptions.
///
/// The one-active-per-tenant rule is the partial unique index
/// `uq_subscriptions_one_active_per_tenant`; a losing concurrent insert
/// surfaces here as `Conflict`.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for SubscriptionRepository {
    async fn create_subscription(&self, data: &CreateSubscription) -> AppResult<Subscription> {
        sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions (id, tenant_id, plan_id, status, started_at, expires_at) \
             VALUES ($1, $2, $3, 'ACTIVE', NOW(), $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.tenant_id)
        .bind(data.plan_id)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "Tenant already has an active subscription",
                "Failed to create subscription",
            )
        })
    }

    async fn find_current_subscription(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions \
             WHERE tenant_id = $1 AND status = 'ACTIVE' AND expires_at > $2",
        )
        .bind(tenant_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find active subscription"))
    }

    async fn set_subscription_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> AppResult<Subscription> {
        sqlx::query_as::<_, Subscription>(
            "UPDATE subscriptions SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(subscription_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "Tenant already has an active subscription",
                "Failed to update subscription",
            )
        })?
        .ok_or_else(|| AppError::not_found(format!("Subscription {subscription_id} not found")))
    }

    async fn list_subscriptions(&self, tenant_id: Uuid) -> AppResult<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list subscriptions"))
    }
}
