//! # authhub-client
//!
//! Helpers for applications that sit behind AuthHub.
//!
//! - [`RefreshGuard`] coalesces concurrent refresh attempts into one call.
//! - [`SessionClient`] is a cookie-carrying HTTP client that refreshes once
//!   and retries when a request comes back 401.
//! - [`TokenVerifier`] checks access tokens offline against the published
//!   key set, and [`require_role`] guards role-restricted surfaces.

pub mod refresh;
pub mod session;
pub mod verifier;

pub use refresh::RefreshGuard;
pub use session::SessionClient;
pub use verifier::{TokenVerifier, fetch_jwks, require_role};
