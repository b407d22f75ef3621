//! Transport that posts notifications to a mail relay over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use authhub_core::error::{AppError, ErrorKind};
use authhub_core::result::AppResult;

use super::{Notification, Notifier};

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    #[serde(flatten)]
    notification: &'a Notification,
}

/// Posts each notification as JSON to a relay endpoint.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    relay_url: String,
    from: String,
}

impl HttpNotifier {
    /// Creates a relay client with a request timeout.
    pub fn new(relay_url: &str, from: &str, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build mail relay client", e)
            })?;
        Ok(Self {
            client,
            relay_url: relay_url.to_string(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notification: &Notification) -> AppResult<()> {
        let message = RelayMessage {
            from: &self.from,
            notification,
        };
        self.client
            .post(&self.relay_url)
            .json(&message)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Mail relay request failed", e)
            })?;
        Ok(())
    }
}
