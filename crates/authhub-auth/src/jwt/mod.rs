//! RS256 access tokens and their public verification material.

pub mod claims;
pub mod issuer;
pub mod keys;

pub use claims::AccessClaims;
pub use issuer::{IssuedToken, TokenIssuer};
pub use keys::{Jwk, Jwks, SigningKeys};
