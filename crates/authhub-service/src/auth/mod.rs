//! Authentication flows.

pub mod recovery;
pub mod service;
pub mod types;

pub use service::AuthEngine;
pub use types::{LoginOutcome, LoginRequest, LogoutOutcome, TokenPair};
