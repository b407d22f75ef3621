//! Route handlers organized by domain.

pub mod auth;
pub mod discovery;
pub mod health;
pub mod recovery;
