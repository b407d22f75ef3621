//! # authhub-auth
//!
//! The authentication building blocks the login and refresh flows are
//! composed from.
//!
//! ## Modules
//!
//! - `jwt`: RS256 access token issuance, signing keys and the JWKS document
//! - `password`: Argon2id hashing off the async runtime and password policy
//! - `secret`: random one-time secrets and their SHA-256 digests
//! - `session`: refresh session rotation, reuse detection and eviction
//! - `license`: subscription-based login gating
//! - `audit`: best-effort audit trail recording
//! - `redirect`: same-site redirect validation

pub mod audit;
pub mod jwt;
pub mod license;
pub mod password;
pub mod redirect;
pub mod secret;
pub mod session;

pub use audit::{AuditRecorder, ClientContext};
pub use jwt::{AccessClaims, Jwk, Jwks, SigningKeys, TokenIssuer};
pub use license::LicenseGate;
pub use password::{PasswordHasher, PasswordValidator};
pub use session::{SessionCleanup, SessionManager};
