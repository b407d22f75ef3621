//! Development transport that only logs.

use async_trait::async_trait;
use tracing::info;

use authhub_core::result::AppResult;

use super::{Notification, Notifier};

/// Logs the recipient and kind of each notification. The secret is not logged.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a log notifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> AppResult<()> {
        info!(
            kind = notification.kind(),
            recipient = %notification.recipient(),
            "Notification queued (log transport)"
        );
        Ok(())
    }
}
