//! Scheduled maintenance tasks for AuthHub.
//!
//! A cron scheduler drives periodic jobs. The only job today is the
//! refresh-session sweep, which deletes revoked and expired rows.

pub mod jobs;
pub mod scheduler;

pub use jobs::cleanup::SessionSweepJob;
pub use scheduler::CronScheduler;
