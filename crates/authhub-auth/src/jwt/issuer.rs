//! RS256 access token issuance.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, Header, encode};

use authhub_core::config::AuthConfig;
use authhub_core::error::AppError;
use authhub_core::result::AppResult;

use super::claims::AccessClaims;
use super::keys::{Jwks, SigningKeys};

/// A freshly minted access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWS.
    pub token: String,
    /// The claims it carries, as stamped.
    pub claims: AccessClaims,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}

/// Mints signed access tokens and publishes the matching public keys.
///
/// Verification happens downstream; the issuer never validates its own
/// tokens and keeps no record of them.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    keys: Arc<SigningKeys>,
    issuer: String,
    access_ttl_seconds: u64,
}

impl TokenIssuer {
    /// Creates an issuer from loaded keys and auth configuration.
    pub fn new(keys: Arc<SigningKeys>, config: &AuthConfig) -> Self {
        Self {
            keys,
            issuer: config.issuer.clone(),
            access_ttl_seconds: config.access_token_ttl_seconds,
        }
    }

    /// Configured access token lifetime in seconds.
    pub fn access_ttl_seconds(&self) -> u64 {
        self.access_ttl_seconds
    }

    /// Signs `claims` for `ttl_seconds`, stamping `iss`, `iat` and `exp`.
    ///
    /// The header carries the signing key's `kid`.
    pub fn issue(&self, mut claims: AccessClaims, ttl_seconds: u64) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let ttl = i64::try_from(ttl_seconds)
            .map_err(|_| AppError::configuration("Token lifetime out of range"))?;
        let expires_at = now + Duration::seconds(ttl);

        claims.iss = self.issuer.clone();
        claims.iat = now.timestamp();
        claims.exp = expires_at.timestamp();

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.keys.kid().to_string());

        let token = encode(&header, &claims, self.keys.encoding_key())
            .map_err(|e| AppError::internal(format!("Failed to sign access token: {e}")))?;

        Ok(IssuedToken {
            token,
            claims,
            expires_at,
        })
    }

    /// Signs `claims` with the configured access token lifetime.
    pub fn issue_access(&self, claims: AccessClaims) -> AppResult<IssuedToken> {
        self.issue(claims, self.access_ttl_seconds)
    }

    /// The public key set for the discovery endpoint.
    pub fn jwks(&self) -> Jwks {
        self.keys.jwks()
    }
}
