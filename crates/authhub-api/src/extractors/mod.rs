//! Custom Axum extractors.

pub mod client;
pub mod json;

pub use client::ClientInfo;
pub use json::ValidatedJson;
