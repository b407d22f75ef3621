//! Single-use account action tokens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Purpose of a one-time token stored on an account.
///
/// Each kind has its own hash and expiry slot, so a token issued for one
/// purpose can never be redeemed for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTokenKind {
    /// Redeemed by the reset-password flow.
    PasswordReset,
    /// Redeemed by the verify-email flow.
    EmailVerification,
}

impl ActionTokenKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordReset => "password_reset",
            Self::EmailVerification => "email_verification",
        }
    }
}

impl fmt::Display for ActionTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
