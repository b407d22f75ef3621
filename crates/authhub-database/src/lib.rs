//! # authhub-database
//!
//! Persistence for AuthHub. The [`store`] module defines the storage traits
//! the identity provider is written against and the [`CredentialStore`]
//! bundle that wires them together. [`repositories`] implements them on
//! PostgreSQL; [`store::memory`] implements them in-process.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::CredentialStore;
