//! Refresh session entity.

pub mod model;

pub use model::{NewRefreshSession, RefreshSession, SessionState};
