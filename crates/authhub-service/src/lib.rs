//! # authhub-service
//!
//! Flow orchestration for AuthHub. [`AuthEngine`] composes the credential
//! store, token issuer, session manager and license gate into the login,
//! refresh, logout and recovery flows; [`TenancyService`] provisions
//! plans, tenants, subscriptions and accounts.
//!
//! Services follow constructor injection: every dependency is handed in
//! at construction time.

pub mod auth;
pub mod notifier;
pub mod tenancy;

#[cfg(test)]
mod testing;

pub use auth::{AuthEngine, LoginOutcome, LoginRequest, LogoutOutcome, TokenPair};
pub use notifier::{Notification, NotificationDispatcher, Notifier};
pub use tenancy::{CreateAccountRequest, SeedOutcome, SeedRequest, TenancyService};
