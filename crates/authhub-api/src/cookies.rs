//! Token transport over HTTP-only cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};

use authhub_core::config::AuthConfig;
use authhub_service::TokenPair;

/// Cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie carrying the raw refresh secret.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Adds both token cookies to `jar`.
///
/// Cookies are HTTP-only and `SameSite=Lax`. In production they are also
/// `Secure` and scoped to the parent domain so every subdomain app sees them.
pub fn with_tokens(jar: CookieJar, tokens: &TokenPair, config: &AuthConfig) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_COOKIE,
        tokens.access_token.clone(),
        tokens.access_expires_at,
        config,
    ))
    .add(token_cookie(
        REFRESH_COOKIE,
        tokens.refresh_token.clone(),
        tokens.refresh_expires_at,
        config,
    ))
}

/// Expires both token cookies on the client, whether or not the request
/// carried them.
pub fn cleared(jar: CookieJar, config: &AuthConfig) -> CookieJar {
    jar.add(removal(ACCESS_COOKIE, config))
        .add(removal(REFRESH_COOKIE, config))
}

/// The raw refresh secret presented by the client, if any.
pub fn refresh_secret(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

fn token_cookie(
    name: &'static str,
    value: String,
    expires_at: DateTime<Utc>,
    config: &AuthConfig,
) -> Cookie<'static> {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    let mut builder = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.production)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age));
    if let Some(domain) = config.cookie_domain() {
        builder = builder.domain(domain);
    }
    builder.build()
}

fn removal(name: &'static str, config: &AuthConfig) -> Cookie<'static> {
    let mut builder = Cookie::build(name).path("/");
    if let Some(domain) = config.cookie_domain() {
        builder = builder.domain(domain);
    }
    let mut cookie = builder.build();
    cookie.make_removal();
    cookie
}
