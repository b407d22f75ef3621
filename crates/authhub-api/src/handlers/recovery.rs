//! Password reset and email verification handlers.

use axum::Json;
use axum::extract::{Query, State};

use authhub_core::error::AppError;

use crate::dto::request::{ForgotPasswordBody, ResetPasswordBody, VerifyEmailQuery};
use crate::dto::response::{MessageResponse, SuccessMessageResponse};
use crate::error::ApiError;
use crate::extractors::{ClientInfo, ValidatedJson};
use crate::state::AppState;

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent";

/// POST /auth/forgot-password
///
/// Answers identically whether or not the email is registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ForgotPasswordBody>,
) -> Json<MessageResponse> {
    state.engine.forgot_password(&body.email).await;
    Json(MessageResponse {
        message: FORGOT_PASSWORD_MESSAGE.to_string(),
    })
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(body): ValidatedJson<ResetPasswordBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .engine
        .reset_password(&body.token, &body.password, &client)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password has been reset".to_string(),
    }))
}

/// GET /auth/verify-email?token=
pub async fn verify_email(
    State(state): State<AppState>,
    client: ClientInfo,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<SuccessMessageResponse>, ApiError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::validation("Invalid or expired token"))?;

    state.engine.verify_email(&token, &client).await?;
    Ok(Json(SuccessMessageResponse {
        success: true,
        message: "Email verified".to_string(),
    }))
}
