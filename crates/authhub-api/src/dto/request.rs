//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginBody {
    /// Email address.
    #[validate(email(message = "A valid email is required"), length(max = 320))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
    /// Client application the tokens are requested for.
    #[validate(length(min = 1, max = 255, message = "Audience is required"))]
    pub aud: String,
    /// Post-login destination hint.
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub redirect: Option<String>,
}

/// Password reset request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordBody {
    /// Email address.
    #[validate(email(message = "A valid email is required"), length(max = 320))]
    pub email: String,
}

/// Password reset completion body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordBody {
    /// Raw reset token from the email.
    #[validate(length(min = 1, max = 256, message = "Token is required"))]
    pub token: String,
    /// New password. Strength is checked by the password policy.
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
}

/// Query of the email verification link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailQuery {
    /// Raw verification token.
    pub token: Option<String>,
}
