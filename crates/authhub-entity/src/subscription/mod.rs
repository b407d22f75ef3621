//! Subscription entity and status.

pub mod model;
pub mod status;

pub use model::{CreateSubscription, Subscription};
pub use status::SubscriptionStatus;
