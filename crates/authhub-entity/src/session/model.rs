//! Refresh session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Derived state of a refresh session at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Usable for exactly one rotation.
    Active,
    /// Revoked by logout, rotation, eviction or reuse detection. Terminal.
    Revoked,
    /// Past its expiry. Terminal, never stored.
    Expired,
}

/// A refresh token record.
///
/// Only the SHA-256 of the secret is stored. The raw secret is handed to
/// the client once and cannot be recovered from this row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// Owning account.
    pub account_id: Uuid,
    /// Hex SHA-256 of the refresh secret (unique).
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Account `token_version` at the original login, inherited by rotations.
    pub token_version: i32,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Revocation timestamp.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Insertion order, used to break `created_at` ties.
    pub seq: i64,
}

impl RefreshSession {
    /// Revocation wins over expiry so that a replayed, rotated-away token
    /// is always recognised as reuse.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.revoked_at.is_some() {
            SessionState::Revoked
        } else if self.expires_at <= now {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }

    /// Check whether the session is usable right now.
    pub fn is_active(&self) -> bool {
        self.state_at(Utc::now()) == SessionState::Active
    }
}

/// Data required to persist a new refresh session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRefreshSession {
    /// Owning account.
    pub account_id: Uuid,
    /// Hex SHA-256 of the refresh secret.
    pub token_hash: String,
    /// Account `token_version` the session is bound to.
    pub token_version: i32,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}
