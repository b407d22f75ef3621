//! Scheduled job implementations.

pub mod cleanup;
