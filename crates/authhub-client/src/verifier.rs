//! Offline access token verification against the published key set.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use moka::future::Cache;
use tracing::debug;
use url::Url;

use authhub_auth::jwt::{AccessClaims, Jwks};
use authhub_core::error::AppError;
use authhub_core::result::AppResult;
use authhub_entity::account::AccountRole;

/// Allowed clock drift when checking `exp`.
pub const LEEWAY_SECONDS: u64 = 60;

/// Path of the key discovery document.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

struct VerificationKey {
    kid: Option<String>,
    key: DecodingKey,
}

/// Verifies RS256 access tokens without contacting the issuer.
///
/// Checks signature, `iss`, `aud` and `exp`. Revocation is not visible
/// here: a token stays valid until it expires.
pub struct TokenVerifier {
    keys: Vec<VerificationKey>,
    validation: Validation,
    cache: Option<Cache<String, AccessClaims>>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("keys", &self.keys.len())
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl TokenVerifier {
    /// Builds a verifier from a fetched key set.
    pub fn from_jwks(jwks: &Jwks, issuer: &str, audiences: &[&str]) -> AppResult<Self> {
        let keys = jwks
            .keys
            .iter()
            .filter(|k| k.kty == "RSA" && k.alg == "RS256")
            .map(|k| {
                DecodingKey::from_rsa_components(&k.n, &k.e)
                    .map(|key| VerificationKey {
                        kid: Some(k.kid.clone()),
                        key,
                    })
                    .map_err(|e| AppError::configuration(format!("Invalid JWK '{}': {e}", k.kid)))
            })
            .collect::<AppResult<Vec<_>>>()?;

        if keys.is_empty() {
            return Err(AppError::configuration("Key set holds no RS256 keys"));
        }
        Self::build(keys, issuer, audiences)
    }

    /// Builds a verifier from an SPKI or PKCS#1 public key PEM.
    pub fn from_public_pem(pem: &str, issuer: &str, audiences: &[&str]) -> AppResult<Self> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AppError::configuration(format!("Invalid RSA public key: {e}")))?;
        Self::build(vec![VerificationKey { kid: None, key }], issuer, audiences)
    }

    fn build(keys: Vec<VerificationKey>, issuer: &str, audiences: &[&str]) -> AppResult<Self> {
        if audiences.is_empty() {
            return Err(AppError::configuration("At least one audience is required"));
        }

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(audiences);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = LEEWAY_SECONDS;

        Ok(Self {
            keys,
            validation,
            cache: None,
        })
    }

    /// Remembers verified tokens for up to `ttl`.
    ///
    /// A cached entry is still dropped once its own `exp` has passed.
    pub fn with_cache(mut self, max_capacity: u64, ttl: Duration) -> Self {
        self.cache = Some(
            Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        );
        self
    }

    /// Verifies `token` and returns its claims.
    pub async fn verify(&self, token: &str) -> AppResult<AccessClaims> {
        if let Some(cache) = &self.cache {
            if let Some(claims) = cache.get(token).await {
                if claims.exp + LEEWAY_SECONDS as i64 > Utc::now().timestamp() {
                    return Ok(claims);
                }
                cache.invalidate(token).await;
            }
        }

        let claims = self.decode(token)?;
        if let Some(cache) = &self.cache {
            cache.insert(token.to_string(), claims.clone()).await;
        }
        Ok(claims)
    }

    fn decode(&self, token: &str) -> AppResult<AccessClaims> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Malformed access token");
            AppError::session("Invalid access token")
        })?;

        let key = self.select_key(header.kid.as_deref()).ok_or_else(|| {
            debug!(kid = ?header.kid, "No verification key for token");
            AppError::session("Invalid access token")
        })?;

        decode::<AccessClaims>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Access token rejected");
                AppError::session("Invalid access token")
            })
    }

    fn select_key(&self, kid: Option<&str>) -> Option<&DecodingKey> {
        let unnamed = || self.keys.iter().find(|k| k.kid.is_none());
        let found = match kid {
            Some(kid) => self
                .keys
                .iter()
                .find(|k| k.kid.as_deref() == Some(kid))
                .or_else(unnamed),
            None if self.keys.len() == 1 => self.keys.first(),
            None => unnamed(),
        };
        found.map(|k| &k.key)
    }
}

/// Fetches the key set published by the AuthHub server at `base_url`.
pub async fn fetch_jwks(http: &reqwest::Client, base_url: &Url) -> AppResult<Jwks> {
    let url = base_url
        .join(JWKS_PATH)
        .map_err(|e| AppError::configuration(format!("Invalid AuthHub URL: {e}")))?;

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::external_service(format!("Key set request failed: {e}")))?;
    if !response.status().is_success() {
        return Err(AppError::external_service(format!(
            "Key set request returned {}",
            response.status()
        )));
    }
    response
        .json::<Jwks>()
        .await
        .map_err(|e| AppError::external_service(format!("Malformed key set: {e}")))
}

/// Rejects claims that do not carry `role`.
pub fn require_role(claims: &AccessClaims, role: AccountRole) -> AppResult<()> {
    if claims.has_role(role) {
        Ok(())
    } else {
        Err(AppError::authorization("Insufficient role"))
    }
}
