//! PostgreSQL implementations of the storage traits.

pub mod account;
pub mod audit;
pub mod session;
pub mod subscription;
pub mod tenant;

use async_trait::async_trait;
use sqlx::PgPool;

use authhub_core::error::{AppError, ErrorKind};
use authhub_core::result::AppResult;

use crate::store::StoreHealth;

pub use account::AccountRepository;
pub use audit::AuditRepository;
pub use session::SessionRepository;
pub use subscription::SubscriptionRepository;
pub use tenant::TenantRepository;

/// Maps a write error, turning unique and foreign-key violations into `Conflict`.
pub(crate) fn map_write_error(err: sqlx::Error, conflict: &str, context: &str) -> AppError {
    let violates_constraint = matches!(
        &err,
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation()
    );
    if violates_constraint {
        AppError::with_source(ErrorKind::Conflict, conflict, err)
    } else {
        AppError::with_source(ErrorKind::Database, context, err)
    }
}

/// Maps a read error.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

/// `SELECT 1` liveness probe.
#[derive(Debug, Clone)]
pub struct PostgresHealth {
    pool: PgPool,
}

impl PostgresHealth {
    /// Create a new health probe.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreHealth for PostgresHealth {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(db_error("Health check failed"))
    }
}
