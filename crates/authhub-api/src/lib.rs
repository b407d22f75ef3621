//! # authhub-api
//!
//! HTTP surface of the AuthHub identity provider built on Axum.
//!
//! Provides the `/auth/*` endpoints, key discovery, health, the cookie
//! transport for tokens, fixed-window rate limiting, CORS, request
//! logging and the mapping of `AppError` onto HTTP responses.

pub mod app;
pub mod cookies;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
