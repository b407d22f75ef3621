//! Auth handlers: login, refresh, logout.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use authhub_service::LoginRequest;

use crate::cookies;
use crate::dto::request::LoginBody;
use crate::dto::response::{LoginResponse, SuccessResponse};
use crate::error::ApiError;
use crate::extractors::{ClientInfo, ValidatedJson};
use crate::state::AppState;

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<LoginBody>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let request = LoginRequest {
        email: body.email,
        password: body.password,
        audience: body.aud,
        redirect: body.redirect,
    };
    let outcome = state.engine.login(&request, &client).await?;

    let jar = cookies::with_tokens(jar, &outcome.tokens, &state.config.auth);
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            redirect: outcome.redirect,
        }),
    ))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SuccessResponse>), ApiError> {
    let secret = cookies::refresh_secret(&jar);
    let tokens = state.engine.refresh(secret.as_deref(), &client).await?;

    let jar = cookies::with_tokens(jar, &tokens, &state.config.auth);
    Ok((jar, Json(SuccessResponse::ok())))
}

/// POST /auth/logout
///
/// Cookies are cleared even when revocation fails.
pub async fn logout(State(state): State<AppState>, client: ClientInfo, jar: CookieJar) -> Response {
    let secret = cookies::refresh_secret(&jar);
    let result = state.engine.logout(secret.as_deref(), &client).await;

    let jar = cookies::cleared(jar, &state.config.auth);
    match result {
        Ok(_) => (jar, Json(SuccessResponse::ok())).into_response(),
        Err(e) => (jar, ApiError(e)).into_response(),
    }
}
