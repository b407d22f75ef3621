//! Plan, tenant, subscription and account provisioning.

pub mod service;

pub use service::{CreateAccountRequest, SeedOutcome, SeedRequest, TenancyService};
