//! RSA signing key material and its JWK publication.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::EncodingKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use tracing::info;

use authhub_core::config::AuthConfig;
use authhub_core::error::AppError;
use authhub_core::result::AppResult;

/// One public key in JWK form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, always `RSA`.
    pub kty: String,
    /// Intended use, always `sig`.
    #[serde(rename = "use")]
    pub use_field: String,
    /// Signing algorithm, always `RS256`.
    pub alg: String,
    /// Key identifier matching the token header `kid`.
    pub kid: String,
    /// Base64url modulus.
    pub n: String,
    /// Base64url public exponent.
    pub e: String,
}

/// A JSON Web Key Set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// Published keys.
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Finds a key by `kid`.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

/// The issuer's private signing key together with its public half.
///
/// The private key never leaves this struct; only the JWK and the public
/// PEM are exposed.
#[derive(Clone)]
pub struct SigningKeys {
    kid: String,
    encoding_key: EncodingKey,
    public_pem: String,
    jwk: Jwk,
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

impl SigningKeys {
    /// Loads the key pair named by the auth configuration.
    ///
    /// When a public key path is configured it must match the private key.
    pub fn load(config: &AuthConfig) -> AppResult<Self> {
        let private_pem = read_pem(&config.private_key_path)?;
        let keys = Self::from_private_pem(&config.key_id, &private_pem)?;

        if let Some(public_path) = &config.public_key_path {
            let configured = parse_public_key(&read_pem(public_path)?)?;
            if jwk_components(&configured) != (keys.jwk.n.clone(), keys.jwk.e.clone()) {
                return Err(AppError::configuration(format!(
                    "Public key {public_path} does not match the private key"
                )));
            }
        }

        info!(kid = %keys.kid, path = %config.private_key_path, "Loaded signing key");
        Ok(keys)
    }

    /// Builds the key pair from a PKCS#8 or PKCS#1 private key PEM.
    pub fn from_private_pem(kid: &str, pem: &str) -> AppResult<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| AppError::configuration(format!("Invalid RSA private key: {e}")))?;
        let public_key = RsaPublicKey::from(&private_key);

        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AppError::configuration(format!("Unusable RSA signing key: {e}")))?;
        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AppError::configuration(format!("Failed to encode public key: {e}")))?;

        let (n, e) = jwk_components(&public_key);
        Ok(Self {
            kid: kid.to_string(),
            encoding_key,
            public_pem,
            jwk: Jwk {
                kty: "RSA".to_string(),
                use_field: "sig".to_string(),
                alg: "RS256".to_string(),
                kid: kid.to_string(),
                n,
                e,
            },
        })
    }

    /// Generates a fresh RSA key pair, returned as (PKCS#8 private PEM, SPKI public PEM).
    pub fn generate_pem_pair(bits: usize) -> AppResult<(String, String)> {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| AppError::internal(format!("RSA key generation failed: {e}")))?;
        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AppError::internal(format!("Failed to encode private key: {e}")))?
            .to_string();
        let public_pem = RsaPublicKey::from(&private_key)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AppError::internal(format!("Failed to encode public key: {e}")))?;
        Ok((private_pem, public_pem))
    }

    /// Key identifier.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Signing key.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// SPKI PEM of the public key.
    pub fn public_pem(&self) -> &str {
        &self.public_pem
    }

    /// The public key set published at the discovery endpoint.
    pub fn jwks(&self) -> Jwks {
        Jwks {
            keys: vec![self.jwk.clone()],
        }
    }
}

fn read_pem(path: &str) -> AppResult<String> {
    std::fs::read_to_string(Path::new(path)).map_err(|e| {
        AppError::with_source(
            authhub_core::error::ErrorKind::Configuration,
            format!("Failed to read key file {path}"),
            e,
        )
    })
}

fn parse_public_key(pem: &str) -> AppResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| AppError::configuration(format!("Invalid RSA public key: {e}")))
}

fn jwk_components(key: &RsaPublicKey) -> (String, String) {
    (
        URL_SAFE_NO_PAD.encode(key.n().to_bytes_be()),
        URL_SAFE_NO_PAD.encode(key.e().to_bytes_be()),
    )
}
