//! Account role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles an account can hold.
///
/// `SuperAdmin` accounts are platform-level and never belong to a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountRole {
    /// Platform operator.
    #[serde(rename = "SUPERADMIN")]
    #[sqlx(rename = "SUPERADMIN")]
    SuperAdmin,
    /// Tenant administrator.
    Admin,
    /// Regular tenant member.
    User,
}

impl AccountRole {
    /// Return the role as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPERADMIN",
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }

    /// Whether accounts with this role must be bound to a tenant.
    pub fn requires_tenant(&self) -> bool {
        !matches!(self, Self::SuperAdmin)
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = authhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SUPERADMIN" => Ok(Self::SuperAdmin),
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            _ => Err(authhub_core::AppError::validation(format!(
                "Invalid account role: '{s}'. Expected one of: SUPERADMIN, ADMIN, USER"
            ))),
        }
    }
}
