//! Random one-time secrets and their stored digests.
//!
//! Only [`hash_secret`] output is ever persisted; the raw secret goes to
//! the client once.

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Random bytes in a refresh token secret.
pub const REFRESH_SECRET_BYTES: usize = 64;
/// Random bytes in a password reset or email verification secret.
pub const ACTION_SECRET_BYTES: usize = 32;

/// Generates `bytes` random bytes from the OS RNG, hex-encoded.
pub fn generate_secret(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Hex SHA-256 of a raw secret.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}
