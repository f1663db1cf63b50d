//! Request extractors: the acting user, the requested API version, path
//! parameters, and validated JSON bodies.

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use codecamp_core::versioning::VERSION_HEADER;
use codecamp_core::{ApiVersion, Principal};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Current user
// ---------------------------------------------------------------------------

/// The authenticated caller. Rejects with 401 when no valid token is
/// presented as a bearer header or auth cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Principal);

impl CurrentUser {
    /// The caller's user name.
    pub fn user_name(&self) -> &str {
        &self.0.user_name
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();
    (!token.is_empty()).then_some(token)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let settings = state.config.current().await;
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_value(&parts.headers, &settings.tokens.cookie_name))
            .ok_or(ApiError::Unauthorized)?;

        let principal = state.tokens().await.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "rejected credentials");
            ApiError::Unauthorized
        })?;

        Ok(Self(principal))
    }
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// The API version selected by the `ver` header. Rejects with 400 when the
/// value is malformed or unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version(pub ApiVersion);

impl<S: Send + Sync> FromRequestParts<S> for Version {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = match parts.headers.get(VERSION_HEADER) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|e| ApiError::BadRequest(format!("Malformed API version: {e}")))?,
            ),
            None => None,
        };
        ApiVersion::resolve(raw)
            .map(Self)
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Path and query
// ---------------------------------------------------------------------------

/// Path parameters. An unparseable segment (say, a non-numeric id) is a 400
/// with the usual error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query-string options, rejected like [`ApiPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

// ---------------------------------------------------------------------------
// Validated JSON
// ---------------------------------------------------------------------------

/// A JSON body that deserialized and passed its validation rules. Any
/// failure is a 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| ApiError::BadRequest(errors.to_string()))?;
        Ok(Self(value))
    }
}
