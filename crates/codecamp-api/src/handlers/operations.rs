//! Operational endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;

/// `OPTIONS /api/operations/reloadConfig`
///
/// Re-reads every configuration source. A failed reload leaves the running
/// settings untouched.
pub async fn reload_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<&'static str>, ApiError> {
    state.config.reload().await.map_err(|e| {
        ApiError::fault(
            "operations.reload_config",
            "Could not reload configuration",
            &e,
        )
    })?;
    Ok(Json("Configuration reloaded"))
}
