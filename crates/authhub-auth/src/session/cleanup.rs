//! Periodic garbage collection of dead refresh sessions.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use authhub_core::result::AppResult;
use authhub_database::store::SessionStore;

/// Deletes sessions that are revoked or past expiry.
///
/// Safe at any cadence: dead rows have no behavioural effect. Rotation
/// revokes and inserts inside one store unit, so a sweep never observes a
/// half-rotated pair.
#[derive(Clone)]
pub struct SessionCleanup {
    sessions: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCleanup").finish()
    }
}

impl SessionCleanup {
    /// Creates a new session cleanup handler.
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// Runs one sweep and returns the number of deleted rows.
    pub async fn run_cleanup(&self) -> AppResult<u64> {
        let deleted = self.sessions.sweep_expired_or_revoked(Utc::now()).await?;
        info!(deleted = deleted, "Session sweep completed");
        Ok(deleted)
    }
}
