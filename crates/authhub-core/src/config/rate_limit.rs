//! Per-endpoint fixed-window rate limits.

use serde::{Deserialize, Serialize};

/// A request budget for one fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLimit {
    /// Requests admitted per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_seconds: u64,
}

impl WindowLimit {
    /// Creates a new window limit.
    pub const fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }
}

/// Rate limits keyed by endpoint category. Discovery and health are exempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Master switch.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// `POST /auth/login`.
    #[serde(default = "default_login")]
    pub login: WindowLimit,
    /// `POST /auth/refresh`.
    #[serde(default = "default_refresh")]
    pub refresh: WindowLimit,
    /// `POST /auth/logout`.
    #[serde(default = "default_logout")]
    pub logout: WindowLimit,
    /// `POST /auth/forgot-password`.
    #[serde(default = "default_forgot_password")]
    pub forgot_password: WindowLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            login: default_login(),
            refresh: default_refresh(),
            logout: default_logout(),
            forgot_password: default_forgot_password(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_login() -> WindowLimit {
    WindowLimit::new(10, 900)
}

fn default_refresh() -> WindowLimit {
    WindowLimit::new(30, 60)
}

fn default_logout() -> WindowLimit {
    WindowLimit::new(20, 60)
}

fn default_forgot_password() -> WindowLimit {
    WindowLimit::new(5, 900)
}
