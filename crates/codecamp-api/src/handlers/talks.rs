//! Talk endpoints under `/api/camps/{moniker}/speakers/{speaker_id}/talks`.
//!
//! Every version shares list, get, update, and delete. Create is selected
//! by version: 2.0 additionally requires the starting time to fall within
//! the camp's days.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;

use codecamp_core::mapping::{camp_window_contains, merge_talk, new_talk_details, to_talk_model};
use codecamp_core::versioning::talk_listing;
use codecamp_core::{ListEnvelope, TalkCreate};
use codecamp_db::{Change, ChangeSet};
use codecamp_types::{
    CampDetails, NewTalk, Speaker, SpeakerId, Talk, TalkId, TalkInput, TalkModel,
};

use crate::error::ApiError;
use crate::extract::{ApiPath, CurrentUser, ValidJson, Version};
use crate::handlers::speakers::{ensure_owner, speaker_in_camp};
use crate::state::AppState;

async fn talk_of_speaker(
    state: &AppState,
    speaker: &Speaker,
    id: TalkId,
    operation: &'static str,
) -> Result<Talk, ApiError> {
    let talk = state
        .repo
        .talk(id)
        .await
        .map_err(|e| ApiError::fault(operation, "Could not load talk", &e))?
        .ok_or_else(|| ApiError::NotFound(format!("Talk {id} was not found")))?;

    if talk.speaker_id != speaker.id {
        return Err(ApiError::BadRequest(String::from(
            "Talk and Speaker do not match",
        )));
    }
    Ok(talk)
}

/// `GET .../talks`
pub async fn list_talks(
    State(state): State<Arc<AppState>>,
    ApiPath((moniker, speaker_id)): ApiPath<(String, i64)>,
    Version(version): Version,
) -> Result<Json<ListEnvelope<TalkModel>>, ApiError> {
    let speaker =
        speaker_in_camp(&state, &moniker, SpeakerId(speaker_id), false, "talks.list").await?;
    let talks = state
        .repo
        .talks(speaker.id)
        .await
        .map_err(|e| ApiError::fault("talks.list", "Could not load talks", &e))?;

    let links = state.links().await;
    Ok(Json(talk_listing(version, &talks, &moniker, &links)))
}

/// `GET .../talks/{talk_id}`
pub async fn get_talk(
    State(state): State<Arc<AppState>>,
    ApiPath((moniker, speaker_id, id)): ApiPath<(String, i64, i64)>,
    Version(_): Version,
) -> Result<Json<TalkModel>, ApiError> {
    let speaker =
        speaker_in_camp(&state, &moniker, SpeakerId(speaker_id), false, "talks.get").await?;
    let talk = talk_of_speaker(&state, &speaker, TalkId(id), "talks.get").await?;
    Ok(Json(to_talk_model(&talk, &moniker, &state.links().await)))
}

/// `POST .../talks`
pub async fn create_talk(
    State(state): State<Arc<AppState>>,
    ApiPath((moniker, speaker_id)): ApiPath<(String, i64)>,
    Version(version): Version,
    user: CurrentUser,
    ValidJson(input): ValidJson<TalkInput>,
) -> Result<impl IntoResponse, ApiError> {
    const FAILED: &str = "Could not add new talk";

    let speaker =
        speaker_in_camp(&state, &moniker, SpeakerId(speaker_id), false, "talks.create").await?;
    ensure_owner(&speaker, &user)?;

    let camp = state
        .repo
        .camp(speaker.camp.id)
        .await
        .map_err(|e| ApiError::fault("talks.create", FAILED, &e))?
        .ok_or_else(|| ApiError::BadRequest(String::from("Could not find Camp")))?;

    let starting_time = input.starting_time;
    let mut details = new_talk_details(input).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if starting_time.is_none() {
        details.start_time = camp.details.event_date;
    }

    match version.talk_create() {
        TalkCreate::Unchecked => {}
        TalkCreate::CampWindowChecked => ensure_within_camp(&camp.details, details.start_time)?,
    }

    let new_talk = NewTalk {
        speaker_id: speaker.id,
        details,
    };
    let id = state
        .repo
        .save_all(ChangeSet::new().with(Change::AddTalk(Box::new(new_talk.clone()))))
        .await
        .map_err(|e| ApiError::fault("talks.create", FAILED, &e))?
        .talk()
        .ok_or_else(|| ApiError::BadRequest(String::from(FAILED)))?;

    let talk = Talk {
        id,
        speaker_id: new_talk.speaker_id,
        details: new_talk.details,
    };
    let model = to_talk_model(&talk, &moniker, &state.links().await);

    tracing::info!(talk_id = %id, speaker_id = %speaker.id, %version, "Talk created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, model.url.clone())],
        Json(model),
    ))
}

fn ensure_within_camp(
    camp: &CampDetails,
    start: chrono::NaiveDateTime,
) -> Result<(), ApiError> {
    let inside = camp_window_contains(camp, start)
        .map_err(|e| ApiError::fault("talks.create", "Could not add new talk", &e))?;
    if inside {
        Ok(())
    } else {
        Err(ApiError::BadRequest(String::from(
            "Talk must start during the camp",
        )))
    }
}

/// `PUT .../talks/{talk_id}`
pub async fn update_talk(
    State(state): State<Arc<AppState>>,
    ApiPath((moniker, speaker_id, id)): ApiPath<(String, i64, i64)>,
    Version(_): Version,
    user: CurrentUser,
    ValidJson(input): ValidJson<TalkInput>,
) -> Result<Json<TalkModel>, ApiError> {
    let speaker =
        speaker_in_camp(&state, &moniker, SpeakerId(speaker_id), false, "talks.update").await?;
    let mut talk = talk_of_speaker(&state, &speaker, TalkId(id), "talks.update").await?;
    ensure_owner(&speaker, &user)?;

    merge_talk(&mut talk.details, input);
    state
        .repo
        .save_all(ChangeSet::new().with(Change::UpdateTalk(talk.id, Box::new(talk.details.clone()))))
        .await
        .map_err(|e| ApiError::fault("talks.update", "Could not update talk", &e))?;

    Ok(Json(to_talk_model(&talk, &moniker, &state.links().await)))
}

/// `DELETE .../talks/{talk_id}`
pub async fn delete_talk(
    State(state): State<Arc<AppState>>,
    ApiPath((moniker, speaker_id, id)): ApiPath<(String, i64, i64)>,
    Version(_): Version,
    user: CurrentUser,
) -> Result<StatusCode, ApiError> {
    let speaker =
        speaker_in_camp(&state, &moniker, SpeakerId(speaker_id), false, "talks.delete").await?;
    let talk = talk_of_speaker(&state, &speaker, TalkId(id), "talks.delete").await?;
    ensure_owner(&speaker, &user)?;

    state
        .repo
        .save_all(ChangeSet::new().with(Change::DeleteTalk(talk.id)))
        .await
        .map_err(|e| ApiError::fault("talks.delete", "Could not delete talk", &e))?;

    tracing::info!(talk_id = %talk.id, "Talk deleted");
    Ok(StatusCode::OK)
}
