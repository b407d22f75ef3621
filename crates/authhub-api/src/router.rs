//! Route definitions for the AuthHub HTTP API.

use axum::extract::DefaultBodyLimit;
use axum::routing::{MethodRouter, get, post};
use axum::{Extension, Router, middleware as axum_middleware};
use axum_extra::extract::cookie::CookieJar;

use crate::cookies;
use crate::extractors::client::TrustedProxies;
use crate::handlers;
use crate::middleware;
use crate::middleware::rate_limit::{RateCategory, RouteLimit, enforce_rate_limit};
use crate::state::AppState;

/// Builds the router with every route and the per-route rate limits.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let trusted_proxies = TrustedProxies(state.config.server.trusted_proxies);

    Router::new()
        .merge(auth_routes(&state))
        .merge(public_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(trusted_proxies))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// `/auth/*` endpoints. Discovery and health stay unlimited.
fn auth_routes(state: &AppState) -> Router<AppState> {
    let limited = |route: MethodRouter<AppState>, category: RateCategory| {
        let rejection_cookies = (category == RateCategory::Logout)
            .then(|| cookies::cleared(CookieJar::new(), &state.config.auth));
        route.layer(axum_middleware::from_fn_with_state(
            RouteLimit {
                limiter: state.rate_limiter.clone(),
                category,
                rejection_cookies,
            },
            enforce_rate_limit,
        ))
    };

    Router::new()
        .route(
            "/auth/login",
            limited(post(handlers::auth::login), RateCategory::Login),
        )
        .route(
            "/auth/refresh",
            limited(post(handlers::auth::refresh), RateCategory::Refresh),
        )
        .route(
            "/auth/logout",
            limited(post(handlers::auth::logout), RateCategory::Logout),
        )
        .route(
            "/auth/forgot-password",
            limited(
                post(handlers::recovery::forgot_password),
                RateCategory::ForgotPassword,
            ),
        )
        .route(
            "/auth/reset-password",
            post(handlers::recovery::reset_password),
        )
        .route("/auth/verify-email", get(handlers::recovery::verify_email))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/.well-known/jwks.json", get(handlers::discovery::jwks))
        .route("/health", get(handlers::health::health))
}
