//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token issuance, login policy and cookie settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// PEM file holding the RSA signing key (PKCS#1 or PKCS#8).
    #[serde(default = "default_private_key_path")]
    pub private_key_path: String,
    /// Optional PEM file holding the public key. Derived from the private key when absent.
    #[serde(default)]
    pub public_key_path: Option<String>,
    /// `kid` placed in every token header and published in the JWKS.
    #[serde(default = "default_key_id")]
    pub key_id: String,
    /// `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_seconds: u64,
    /// Refresh session lifetime in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_seconds: u64,
    /// Client applications a token may be issued for.
    #[serde(default = "default_allowed_audiences")]
    pub allowed_audiences: Vec<String>,
    /// Audience used when reissuing tokens on refresh. Defaults to the first allowed audience.
    #[serde(default)]
    pub default_audience: Option<String>,
    /// Parent domain for cookies and redirect validation.
    #[serde(default = "default_root_domain")]
    pub root_domain: String,
    /// Production mode: secure cookies scoped to `.{root_domain}`.
    #[serde(default)]
    pub production: bool,
    /// Maximum active refresh sessions per account.
    #[serde(default = "default_session_limit")]
    pub session_limit: u32,
    /// Leeway applied by token verifiers, in seconds.
    #[serde(default = "default_clock_skew")]
    pub clock_skew_seconds: u64,
    /// Password reset token lifetime in seconds.
    #[serde(default = "default_password_reset_ttl")]
    pub password_reset_ttl_seconds: u64,
    /// Email verification token lifetime in seconds.
    #[serde(default = "default_email_verification_ttl")]
    pub email_verification_ttl_seconds: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Minimum zxcvbn score (0-4) for new passwords.
    #[serde(default = "default_password_strength")]
    pub password_min_strength: u8,
    /// Upper bound for a single password hash or verification, in seconds.
    #[serde(default = "default_hash_timeout")]
    pub hash_timeout_seconds: u64,
}

impl AuthConfig {
    /// Audience stamped on tokens reissued by refresh.
    pub fn refresh_audience(&self) -> &str {
        self.default_audience
            .as_deref()
            .or_else(|| self.allowed_audiences.first().map(String::as_str))
            .unwrap_or(self.issuer.as_str())
    }

    /// Whether `aud` is on the static allow-list.
    pub fn is_allowed_audience(&self, aud: &str) -> bool {
        self.allowed_audiences.iter().any(|a| a == aud)
    }

    /// Domain attribute for auth cookies. Only set in production.
    pub fn cookie_domain(&self) -> Option<String> {
        self.production
            .then(|| format!(".{}", self.root_domain.trim_start_matches('.')))
    }

    /// Destination used when a redirect hint is absent or unsafe.
    pub fn default_redirect(&self) -> String {
        format!("https://auth.{}", self.root_domain.trim_start_matches('.'))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            private_key_path: default_private_key_path(),
            public_key_path: None,
            key_id: default_key_id(),
            issuer: default_issuer(),
            access_token_ttl_seconds: default_access_ttl(),
            refresh_token_ttl_seconds: default_refresh_ttl(),
            allowed_audiences: default_allowed_audiences(),
            default_audience: None,
            root_domain: default_root_domain(),
            production: false,
            session_limit: default_session_limit(),
            clock_skew_seconds: default_clock_skew(),
            password_reset_ttl_seconds: default_password_reset_ttl(),
            email_verification_ttl_seconds: default_email_verification_ttl(),
            password_min_length: default_password_min(),
            password_min_strength: default_password_strength(),
            hash_timeout_seconds: default_hash_timeout(),
        }
    }
}

fn default_private_key_path() -> String {
    "keys/jwt_private.pem".to_string()
}

fn default_key_id() -> String {
    "authhub-default".to_string()
}

fn default_issuer() -> String {
    "authhub".to_string()
}

fn default_access_ttl() -> u64 {
    900
}

fn default_refresh_ttl() -> u64 {
    604_800
}

fn default_allowed_audiences() -> Vec<String> {
    vec!["authhub-admin".to_string()]
}

fn default_root_domain() -> String {
    "localhost".to_string()
}

fn default_session_limit() -> u32 {
    10
}

fn default_clock_skew() -> u64 {
    60
}

fn default_password_reset_ttl() -> u64 {
    3600
}

fn default_email_verification_ttl() -> u64 {
    86_400
}

fn default_password_min() -> usize {
    8
}

fn default_password_strength() -> u8 {
    2
}

fn default_hash_timeout() -> u64 {
    10
}
