//! Argon2id password hashing and verification.
//!
//! Hashing is CPU-bound, so every call runs on the blocking pool under a
//! timeout instead of stalling an async worker thread.

use std::sync::Arc;
use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use tracing::warn;

use authhub_core::config::AuthConfig;
use authhub_core::error::{AppError, ErrorKind};
use authhub_core::result::AppResult;

/// Fixed input hashed once at start-up for the unknown-account path.
const DUMMY_PASSWORD: &str = "authhub-dummy-password-for-timing";

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    /// Upper bound for one hash or verification.
    timeout: Duration,
    /// Hash compared against when no account matched.
    dummy_hash: Arc<String>,
}

impl PasswordHasher {
    /// Creates a hasher. Computes the dummy hash synchronously.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        Ok(Self {
            timeout: Duration::from_secs(config.hash_timeout_seconds),
            dummy_hash: Arc::new(hash_blocking(DUMMY_PASSWORD)?),
        })
    }

    /// Hashes a plaintext password with a random salt.
    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let password = password.to_string();
        self.run(move || hash_blocking(&password)).await
    }

    /// Verifies a plaintext password against a stored PHC string.
    ///
    /// Returns `Ok(false)` on mismatch.
    pub async fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        self.run(move || verify_blocking(&password, &hash)).await
    }

    /// Burns one verification against the dummy hash and reports failure.
    ///
    /// Used when the account does not exist so that the response takes as
    /// long as a wrong password would.
    pub async fn verify_dummy(&self, password: &str) -> bool {
        let password = password.to_string();
        let hash = Arc::clone(&self.dummy_hash);
        if let Err(e) = self.run(move || verify_blocking(&password, &hash)).await {
            warn!(error = %e, "Dummy password verification failed");
        }
        false
    }

    async fn run<T, F>(&self, work: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> AppResult<T> + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(work);
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(AppError::with_source(
                ErrorKind::Internal,
                "Password hashing task failed",
                join,
            )),
            Err(_) => Err(AppError::service_unavailable("Password hashing timed out")),
        }
    }
}

fn hash_blocking(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

fn verify_blocking(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::internal(format!(
            "Password verification failed: {e}"
        ))),
    }
}
