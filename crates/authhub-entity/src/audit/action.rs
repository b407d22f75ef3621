//! Audit action enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Security-relevant events recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Tokens issued after a successful login.
    LoginSuccess,
    /// Login rejected (unknown account, bad password, audience, inactive).
    LoginFailed,
    /// Login rejected because the email is not verified.
    LoginBlockedEmailNotVerified,
    /// Refresh session revoked by the client.
    Logout,
    /// Tenant has no active, unexpired subscription.
    LicenseExpired,
    /// Refresh session rotated.
    TokenRefreshed,
    /// Password replaced through a reset token.
    PasswordReset,
    /// Email address confirmed.
    EmailVerified,
    /// A revoked refresh secret was presented again.
    TokenReuseDetected,
}

impl AuditAction {
    /// Return the action as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::LoginFailed => "LOGIN_FAILED",
            Self::LoginBlockedEmailNotVerified => "LOGIN_BLOCKED_EMAIL_NOT_VERIFIED",
            Self::Logout => "LOGOUT",
            Self::LicenseExpired => "LICENSE_EXPIRED",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::PasswordReset => "PASSWORD_RESET",
            Self::EmailVerified => "EMAIL_VERIFIED",
            Self::TokenReuseDetected => "TOKEN_REUSE_DETECTED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
