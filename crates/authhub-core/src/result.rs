//! Convenience result type alias for AuthHub.

use crate::error::AppError;

/// A specialized `Result` type for AuthHub operations.
pub type AppResult<T> = Result<T, AppError>;
