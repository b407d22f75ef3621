//! Notification dispatch configuration.

use serde::{Deserialize, Serialize};

/// How outgoing account notifications are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Write the notification to the log only.
    Log,
    /// POST the notification to an HTTP mail relay.
    Http,
}

/// Mail relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Delivery transport.
    #[serde(default = "default_transport")]
    pub transport: MailTransport,
    /// Relay endpoint used by the `http` transport.
    #[serde(default)]
    pub relay_url: Option<String>,
    /// Sender address.
    #[serde(default = "default_from")]
    pub from: String,
    /// Upper bound for a single dispatch, in seconds.
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            relay_url: None,
            from: default_from(),
            dispatch_timeout_seconds: default_dispatch_timeout(),
        }
    }
}

fn default_transport() -> MailTransport {
    MailTransport::Log
}

fn default_from() -> String {
    "no-reply@localhost".to_string()
}

fn default_dispatch_timeout() -> u64 {
    10
}
