//! Camp endpoints under `/api/camps`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use codecamp_core::mapping::{merge_camp, new_camp_details, to_camp_model};
use codecamp_db::{Change, ChangeSet};
use codecamp_types::{Camp, CampInput, CampModel};

use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery, ValidJson};
use crate::state::AppState;

/// Query parameters for `GET /api/camps/{moniker}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampQuery {
    /// Eager-load the camp's speakers.
    #[serde(default)]
    pub include_speakers: bool,
}

fn camp_not_found(moniker: &str) -> ApiError {
    ApiError::NotFound(format!("Camp {moniker} was not found"))
}

async fn existing_camp(
    state: &AppState,
    moniker: &str,
    include_speakers: bool,
    operation: &'static str,
) -> Result<Camp, ApiError> {
    state
        .repo
        .camp_by_moniker(moniker, include_speakers)
        .await
        .map_err(|e| ApiError::fault(operation, "Could not load camp", &e))?
        .ok_or_else(|| camp_not_found(moniker))
}

/// `GET /api/camps`
pub async fn list_camps(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CampModel>>, ApiError> {
    let camps = state
        .repo
        .all_camps()
        .await
        .map_err(|e| ApiError::fault("camps.list", "Could not load camps", &e))?;
    let links = state.links().await;

    let models = camps
        .iter()
        .map(|camp| to_camp_model(camp, &links))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::fault("camps.list", "Could not load camps", &e))?;
    Ok(Json(models))
}

/// `GET /api/camps/{moniker}?includeSpeakers=`
pub async fn get_camp(
    State(state): State<Arc<AppState>>,
    ApiPath(moniker): ApiPath<String>,
    ApiQuery(query): ApiQuery<CampQuery>,
) -> Result<Json<CampModel>, ApiError> {
    let camp = existing_camp(&state, &moniker, query.include_speakers, "camps.get").await?;
    let model = to_camp_model(&camp, &state.links().await)
        .map_err(|e| ApiError::fault("camps.get", "Could not load camp", &e))?;
    Ok(Json(model))
}

/// `POST /api/camps`
pub async fn create_camp(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<CampInput>,
) -> Result<impl IntoResponse, ApiError> {
    let details = new_camp_details(input, Utc::now().date_naive())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let committed = state
        .repo
        .save_all(ChangeSet::new().with(Change::AddCamp(Box::new(details.clone()))))
        .await
        .map_err(|e| ApiError::fault("camps.create", "Could not save camp", &e))?;
    let id = committed
        .camp()
        .ok_or_else(|| ApiError::BadRequest(String::from("Could not save camp")))?;

    let camp = Camp {
        id,
        details,
        speakers: None,
    };
    let model = to_camp_model(&camp, &state.links().await)
        .map_err(|e| ApiError::fault("camps.create", "Could not save camp", &e))?;

    tracing::info!(moniker = %model.moniker, camp_id = %id, "Camp created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, model.url.clone())],
        Json(model),
    ))
}

/// `PUT /api/camps/{moniker}`
pub async fn update_camp(
    State(state): State<Arc<AppState>>,
    ApiPath(moniker): ApiPath<String>,
    ValidJson(input): ValidJson<CampInput>,
) -> Result<Json<CampModel>, ApiError> {
    let mut camp = existing_camp(&state, &moniker, false, "camps.update").await?;
    merge_camp(&mut camp.details, input);

    state
        .repo
        .save_all(ChangeSet::new().with(Change::UpdateCamp(camp.id, Box::new(camp.details.clone()))))
        .await
        .map_err(|e| ApiError::fault("camps.update", "Could not update camp", &e))?;

    let model = to_camp_model(&camp, &state.links().await)
        .map_err(|e| ApiError::fault("camps.update", "Could not update camp", &e))?;
    Ok(Json(model))
}

/// `DELETE /api/camps/{moniker}`
pub async fn delete_camp(
    State(state): State<Arc<AppState>>,
    ApiPath(moniker): ApiPath<String>,
) -> Result<StatusCode, ApiError> {
    let camp = existing_camp(&state, &moniker, false, "camps.delete").await?;

    state
        .repo
        .save_all(ChangeSet::new().with(Change::DeleteCamp(camp.id)))
        .await
        .map_err(|e| ApiError::fault("camps.delete", "Could not delete camp", &e))?;

    tracing::info!(moniker = %moniker, "Camp deleted");
    Ok(StatusCode::OK)
}
