//! Cron scheduler for periodic maintenance tasks.

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::info;

use authhub_core::config::WorkerConfig;
use authhub_core::error::AppError;
use authhub_core::result::AppResult;

use crate::jobs::cleanup::SessionSweepJob;

/// Cron-based scheduler for periodic background tasks.
pub struct CronScheduler {
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Creates an empty scheduler.
    pub async fn new() -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;
        Ok(Self { scheduler })
    }

    /// Registers the session sweep on the configured schedule.
    pub async fn register_session_sweep(
        &self,
        config: &WorkerConfig,
        job: SessionSweepJob,
    ) -> AppResult<()> {
        let cron = config.session_sweep_cron.as_str();
        let task = CronJob::new_async(cron, move |_uuid, _lock| {
            let job = job.clone();
            Box::pin(async move {
                job.run().await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid session sweep schedule '{}': {}", cron, e))
        })?;

        self.scheduler
            .add(task)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add session sweep: {}", e)))?;

        info!(cron = %cron, "Registered: {}", SessionSweepJob::NAME);
        Ok(())
    }

    /// Starts firing registered jobs.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;
        info!("Cron scheduler started");
        Ok(())
    }

    /// Stops the scheduler.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;
        info!("Cron scheduler shut down");
        Ok(())
    }
}
