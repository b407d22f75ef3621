//! Tenant and plan repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_entity::plan::{CreatePlan, Plan};
use authhub_entity::tenant::{CreateTenant, Tenant};

use super::{db_error, map_write_error};
use crate::store::TenantStore;

/// Repository for tenants and the plans they subscribe to.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    /// Create a new tenant repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore for TenantRepository {
    async fn create_plan(&self, data: &CreatePlan) -> AppResult<Plan> {
        sqlx::query_as::<_, Plan>(
            "INSERT INTO plans (id, name, price_cents, max_users, features) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(data.price_cents)
        .bind(data.max_users)
        .bind(&data.features)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Plan name already exists", "Failed to create plan"))
    }

    async fn find_plan_by_name(&self, name: &str) -> AppResult<Option<Plan>> {
        sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find plan"))
    }

    async fn create_tenant(&self, data: &CreateTenant) -> AppResult<Tenant> {
        sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (id, name, subdomain, plan) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(data.subdomain.trim().to_lowercase())
        .bind(data.plan)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, "Subdomain already in use", "Failed to create tenant")
        })
    }

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> AppResult<Option<Tenant>> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE subdomain = $1")
            .bind(subdomain.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find tenant"))
    }

    async fn set_tenant_active(&self, tenant_id: Uuid, active: bool) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE tenants SET active = $2, updated_at = NOW() WHERE id = $1")
                .bind(tenant_id)
                .bind(active)
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to update tenant"))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Tenant {tenant_id} not found")));
        }
        Ok(())
    }

    async fn delete_tenant(&self, tenant_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_write_error(
                    e,
                    "Tenant is still referenced by accounts or subscriptions",
                    "Failed to delete tenant",
                )
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_plan(&self, plan_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM plans WHERE id = $1")
            .bind(plan_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_write_error(
                    e,
                    "Plan is still referenced by subscriptions",
                    "Failed to delete plan",
                )
            })?;
        Ok(result.rows_affected() > 0)
    }
}
