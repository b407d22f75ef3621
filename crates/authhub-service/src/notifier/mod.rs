//! Outbound account notifications (password reset, email verification).
//!
//! Delivery is fire-and-forget: flows hand a [`Notification`] to the
//! [`NotificationDispatcher`], which sends it on a background task under a
//! timeout and only logs the outcome.

pub mod http;
pub mod log;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use authhub_core::config::{MailConfig, MailTransport};
use authhub_core::error::AppError;
use authhub_core::result::AppResult;

pub use self::http::HttpNotifier;
pub use self::log::LogNotifier;

/// A message carrying a one-time secret to an account's email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Password reset link.
    PasswordReset {
        /// Recipient.
        email: String,
        /// Raw reset secret.
        token: String,
        /// When the secret stops working.
        expires_at: DateTime<Utc>,
    },
    /// Email verification link.
    EmailVerification {
        /// Recipient.
        email: String,
        /// Raw verification secret.
        token: String,
        /// When the secret stops working.
        expires_at: DateTime<Utc>,
    },
}

impl Notification {
    /// Recipient address.
    pub fn recipient(&self) -> &str {
        match self {
            Self::PasswordReset { email, .. } | Self::EmailVerification { email, .. } => email,
        }
    }

    /// Short name of the notification kind, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PasswordReset { .. } => "password_reset",
            Self::EmailVerification { .. } => "email_verification",
        }
    }
}

/// A delivery transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    async fn send(&self, notification: &Notification) -> AppResult<()>;
}

/// Sends notifications in the background.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NotificationDispatcher {
    /// Creates a dispatcher over `notifier`.
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self {
            notifier,
            timeout,
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    /// Builds the transport selected by the mail configuration.
    pub fn from_config(config: &MailConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.dispatch_timeout_seconds);
        let notifier: Arc<dyn Notifier> = match config.transport {
            MailTransport::Log => Arc::new(LogNotifier::new()),
            MailTransport::Http => {
                let relay_url = config.relay_url.as_deref().ok_or_else(|| {
                    AppError::configuration("mail.relay_url is required for the http transport")
                })?;
                Arc::new(HttpNotifier::new(relay_url, &config.from, timeout)?)
            }
        };
        Ok(Self::new(notifier, timeout))
    }

    /// Spawns delivery and returns immediately.
    ///
    /// Failures and timeouts are logged, never returned. The handle only
    /// exists so tests can wait for delivery.
    pub fn dispatch(&self, notification: Notification) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.timeout;
        let in_flight = Arc::clone(&self.in_flight);
        let idle = Arc::clone(&self.idle);
        in_flight.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            let kind = notification.kind();
            match tokio::time::timeout(timeout, notifier.send(&notification)).await {
                Ok(Ok(())) => debug!(kind = kind, "Notification delivered"),
                Ok(Err(e)) => warn!(kind = kind, error = %e, "Notification delivery failed"),
                Err(_) => warn!(kind = kind, "Notification delivery timed out"),
            }
            if in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                idle.notify_waiters();
            }
        })
    }

    /// Waits until every dispatched notification has finished or timed out.
    ///
    /// Short-lived processes call this before exiting.
    pub async fn flush(&self) {
        loop {
            let idle = self.idle.notified();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }
}
