//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Always `true`.
    pub success: bool,
    /// Validated post-login destination.
    pub redirect: String,
}

/// Bare success flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Always `true`.
    pub success: bool,
}

impl SuccessResponse {
    /// `{ "success": true }`.
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Human-readable outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Success flag with a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessMessageResponse {
    /// Always `true`.
    pub success: bool,
    /// Message.
    pub message: String,
}

/// Health of one dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// `up` or `down`.
    pub status: String,
    /// Probe round-trip time.
    pub latency_ms: u64,
}

/// Dependencies probed by the health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthServices {
    /// Credential store.
    pub database: ServiceHealth,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Time of the check.
    pub timestamp: DateTime<Utc>,
    /// Per-dependency status.
    pub services: HealthServices,
}
