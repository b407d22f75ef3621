//! Access token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use authhub_entity::account::{AccountRole, AccountWithTenant};
use authhub_entity::tenant::PlanTier;

/// Claims carried by every access token.
///
/// Field names are camelCase on the wire so downstream verifiers written
/// against the JSON payload see `tokenVersion`, `tenantId` and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// Subject, the account ID.
    pub sub: Uuid,
    /// Unique token ID.
    pub jti: Uuid,
    /// Account `token_version` when the token was minted.
    pub token_version: i32,
    /// Owning tenant, `None` for super-administrators.
    pub tenant_id: Option<Uuid>,
    /// Owning tenant's subdomain.
    pub tenant_subdomain: Option<String>,
    /// Owning tenant's plan tier.
    pub plan: Option<PlanTier>,
    /// Account role.
    pub role: AccountRole,
    /// Client application the token is for.
    pub aud: String,
    /// Issuer identity. Stamped by the issuer.
    #[serde(default)]
    pub iss: String,
    /// Issued-at, seconds since epoch. Stamped by the issuer.
    #[serde(default)]
    pub iat: i64,
    /// Expiry, seconds since epoch. Stamped by the issuer.
    #[serde(default)]
    pub exp: i64,
}

impl AccessClaims {
    /// Identity claims for `subject`, addressed to `audience`.
    pub fn for_account(subject: &AccountWithTenant, audience: &str) -> Self {
        let account = &subject.account;
        Self {
            sub: account.id,
            jti: Uuid::new_v4(),
            token_version: account.token_version,
            tenant_id: account.tenant_id,
            tenant_subdomain: subject.tenant.as_ref().map(|t| t.subdomain.clone()),
            plan: subject.tenant.as_ref().map(|t| t.plan),
            role: account.role,
            aud: audience.to_string(),
            iss: String::new(),
            iat: 0,
            exp: 0,
        }
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Checks whether the token carries `role`.
    pub fn has_role(&self, role: AccountRole) -> bool {
        self.role == role
    }
}
