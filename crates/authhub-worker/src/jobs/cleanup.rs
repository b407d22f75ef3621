//! Refresh-session sweep job.

use tracing::{error, info};

use authhub_auth::session::SessionCleanup;

/// Deletes dead refresh sessions on each run.
#[derive(Debug, Clone)]
pub struct SessionSweepJob {
    cleanup: SessionCleanup,
}

impl SessionSweepJob {
    /// Job name used in logs.
    pub const NAME: &'static str = "session_sweep";

    /// Creates the job over a session cleanup handler.
    pub fn new(cleanup: SessionCleanup) -> Self {
        Self { cleanup }
    }

    /// Runs one sweep. Failures are logged; the next tick retries.
    pub async fn run(&self) -> Option<u64> {
        match self.cleanup.run_cleanup().await {
            Ok(deleted) => {
                info!(job = Self::NAME, deleted, "Scheduled job finished");
                Some(deleted)
            }
            Err(e) => {
                error!(job = Self::NAME, error = %e, "Scheduled job failed");
                None
            }
        }
    }
}
