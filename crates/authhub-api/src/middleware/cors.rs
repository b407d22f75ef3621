//! CORS layer configuration.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tracing::warn;

use authhub_core::config::CorsConfig;

/// Builds a CORS tower layer from configuration.
///
/// Token cookies travel cross-origin between subdomain apps, so
/// credentials are always allowed and origins must be listed explicitly.
/// A wildcard entry is ignored.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter(|o| {
            let wildcard = o.as_str() == "*";
            if wildcard {
                warn!("Ignoring wildcard CORS origin; credentialed requests need explicit origins");
            }
            !wildcard
        })
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(config.max_age_seconds))
}
