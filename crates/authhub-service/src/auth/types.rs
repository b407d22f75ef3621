//! Inputs and outputs of the authentication flows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credentials and target of a login attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address, normalized before lookup.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Client application the tokens are for.
    pub audience: String,
    /// Where the client wants to go afterwards. Validated before use.
    pub redirect: Option<String>,
}

/// A signed access token and a raw refresh secret.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Compact RS256 JWS.
    pub access_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Raw refresh secret. Delivered once.
    pub refresh_token: String,
    /// Refresh session expiry.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Issued tokens.
    pub tokens: TokenPair,
    /// Validated destination URL.
    pub redirect: String,
}

/// Result of a logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutOutcome {
    /// Whether a session matched the presented secret.
    pub session_found: bool,
}
