//! Sign-in endpoints.
//!
//! Both endpoints answer every failure with the same 400 message so a
//! caller cannot tell an unknown user from a wrong password.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use codecamp_core::identity::verify_password;
use codecamp_types::{CampUser, CredentialModel, TokenModel};

use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;

const LOGIN_FAILED: &str = "Failed to login";
const TOKEN_FAILED: &str = "Failed to generate token";

async fn verify_credentials(
    state: &AppState,
    payload: Result<ValidJson<CredentialModel>, ApiError>,
) -> Result<CampUser, String> {
    let ValidJson(credentials) = payload.map_err(|e| e.to_string())?;
    let user = state
        .repo
        .user(&credentials.user_name)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("unknown user '{}'", credentials.user_name))?;

    if verify_password(&credentials.password, &user.details.password_hash) {
        Ok(user)
    } else {
        Err(format!("wrong password for '{}'", credentials.user_name))
    }
}

async fn issue_token(
    state: &AppState,
    payload: Result<ValidJson<CredentialModel>, ApiError>,
    operation: &'static str,
    message: &'static str,
) -> Result<TokenModel, ApiError> {
    let user = verify_credentials(state, payload)
        .await
        .map_err(|reason| ApiError::fault(operation, message, &reason))?;
    state
        .tokens()
        .await
        .issue(&user, Utc::now())
        .map_err(|e| ApiError::fault(operation, message, &e))
}

/// `POST /api/auth/login`
///
/// Sets the authentication cookie and returns an empty 200.
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<ValidJson<CredentialModel>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let token = issue_token(&state, payload, "auth.login", LOGIN_FAILED).await?;

    let settings = state.config.current().await;
    let max_age = settings.tokens.lifetime_minutes.saturating_mul(60);
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        settings.tokens.cookie_name, token.token
    );

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

/// `POST /api/auth/token`
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    payload: Result<ValidJson<CredentialModel>, ApiError>,
) -> Result<Json<TokenModel>, ApiError> {
    let token = issue_token(&state, payload, "auth.token", TOKEN_FAILED).await?;
    Ok(Json(token))
}
