//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled maintenance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler starts with the server.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Six-field cron expression for the refresh-session sweep.
    #[serde(default = "default_sweep_cron")]
    pub session_sweep_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            session_sweep_cron: default_sweep_cron(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_cron() -> String {
    "0 0 2 * * *".to_string()
}
