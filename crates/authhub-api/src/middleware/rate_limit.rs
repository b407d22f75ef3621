//! Fixed-window rate limiter keyed by client IP and endpoint category.
//!
//! Counters live in process memory, so limits hold per instance only.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::http::header::RETRY_AFTER;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use dashmap::DashMap;
use tracing::warn;

use authhub_core::config::{RateLimitConfig, WindowLimit};
use authhub_core::error::AppError;

use crate::error::ApiError;
use crate::extractors::client::client_ip;

/// Sweep stale windows once the map grows past this many keys.
const SWEEP_THRESHOLD: usize = 10_000;

/// Rate-limited endpoint groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateCategory {
    /// `POST /auth/login`.
    Login,
    /// `POST /auth/refresh`.
    Refresh,
    /// `POST /auth/logout`.
    Logout,
    /// `POST /auth/forgot-password`.
    ForgotPassword,
}

impl RateCategory {
    /// Name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Refresh => "refresh",
            Self::Logout => "logout",
            Self::ForgotPassword => "forgot_password",
        }
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request fits in the current window.
    Allowed,
    /// The window is full; retry after the given delay.
    Rejected {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Shared fixed-window counters.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<(String, RateCategory), Window>>,
    config: Arc<RateLimitConfig>,
}

impl RateLimiter {
    /// Creates a limiter with the configured windows.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    /// Whether limiting is switched on.
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn limit(&self, category: RateCategory) -> WindowLimit {
        match category {
            RateCategory::Login => self.config.login,
            RateCategory::Refresh => self.config.refresh,
            RateCategory::Logout => self.config.logout,
            RateCategory::ForgotPassword => self.config.forgot_password,
        }
    }

    fn longest_window(&self) -> Duration {
        [
            self.config.login,
            self.config.refresh,
            self.config.logout,
            self.config.forgot_password,
        ]
        .iter()
        .map(|l| Duration::from_secs(l.window_seconds))
        .max()
        .unwrap_or_default()
    }

    /// Counts one request from `ip` against `category` at `now`.
    pub fn check_at(&self, ip: &str, category: RateCategory, now: Instant) -> Admission {
        let limit = self.limit(category);
        let window_len = Duration::from_secs(limit.window_seconds);

        if self.windows.len() > SWEEP_THRESHOLD {
            let longest = self.longest_window();
            self.windows
                .retain(|_, w| now.duration_since(w.started) < longest);
        }

        let mut entry = self
            .windows
            .entry((ip.to_string(), category))
            .or_insert(Window {
                started: now,
                count: 0,
            });
        let window = entry.value_mut();

        if now.duration_since(window.started) >= window_len {
            window.started = now;
            window.count = 0;
        }

        if window.count < limit.max_requests {
            window.count += 1;
            Admission::Allowed
        } else {
            Admission::Rejected {
                retry_after: window_len.saturating_sub(now.duration_since(window.started)),
            }
        }
    }

    /// Counts one request from `ip` against `category` now.
    pub fn check(&self, ip: &str, category: RateCategory) -> Admission {
        self.check_at(ip, category, Instant::now())
    }
}

/// Limiter bound to one endpoint category, used as middleware state.
#[derive(Debug, Clone)]
pub struct RouteLimit {
    /// Shared counters.
    pub limiter: RateLimiter,
    /// Category of the guarded route.
    pub category: RateCategory,
    /// Cookies set on a rejection. Logout still clears its cookies when
    /// limited.
    pub rejection_cookies: Option<CookieJar>,
}

/// Rejects requests over the category's window with 429.
pub async fn enforce_rate_limit(
    State(route): State<RouteLimit>,
    request: Request,
    next: Next,
) -> Response {
    if !route.limiter.enabled() {
        return next.run(request).await;
    }

    let ip = client_ip(request.headers(), request.extensions());
    match route.limiter.check(&ip, route.category) {
        Admission::Allowed => next.run(request).await,
        Admission::Rejected { retry_after } => {
            warn!(ip = %ip, category = route.category.as_str(), "Rate limit exceeded");
            let mut response =
                ApiError(AppError::rate_limit("Too many requests, please try again later"))
                    .into_response();
            let seconds = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            match route.rejection_cookies {
                Some(jar) => (jar, response).into_response(),
                None => response,
            }
        }
    }
}
