//! # authhub-entity
//!
//! Domain entity models for AuthHub. Every struct in this crate represents
//! a database table row or a domain value object. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and database entities
//! additionally derive `sqlx::FromRow`.

pub mod account;
pub mod audit;
pub mod plan;
pub mod session;
pub mod subscription;
pub mod tenant;
