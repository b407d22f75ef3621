//! Audit trail entity.

pub mod action;
pub mod model;

pub use action::AuditAction;
pub use model::{AuditEvent, CreateAuditEvent};
