//! Tenant entity and plan tier.

pub mod model;
pub mod tier;

pub use model::{CreateTenant, Tenant};
pub use tier::PlanTier;
