//! Tenant plan tier enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Commercial tier of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_tier", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanTier {
    /// Free tier.
    Free,
    /// Entry tier.
    Start,
    /// Professional tier.
    Pro,
    /// Enterprise tier.
    Enterprise,
}

impl PlanTier {
    /// Return the tier as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Start => "START",
            Self::Pro => "PRO",
            Self::Enterprise => "ENTERPRISE",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = authhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FREE" => Ok(Self::Free),
            "START" => Ok(Self::Start),
            "PRO" => Ok(Self::Pro),
            "ENTERPRISE" => Ok(Self::Enterprise),
            _ => Err(authhub_core::AppError::validation(format!(
                "Invalid plan tier: '{s}'. Expected one of: FREE, START, PRO, ENTERPRISE"
            ))),
        }
    }
}
