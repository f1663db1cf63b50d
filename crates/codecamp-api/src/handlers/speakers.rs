//! Speaker endpoints under `/api/camps/{moniker}/speakers`.
//!
//! Reads are public. Create binds the caller as owner; update and delete
//! check, in order: the speaker exists (404), it belongs to the camp in the
//! path (400), and the caller owns it (403).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use codecamp_core::mapping::{merge_speaker, new_speaker_details, to_speaker_model};
use codecamp_core::versioning::{SpeakerListing, speaker_listing};
use codecamp_db::{Change, ChangeSet};
use codecamp_types::{NewSpeaker, Speaker, SpeakerId, SpeakerInput, SpeakerModel};

use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery, CurrentUser, ValidJson, Version};
use crate::state::AppState;

/// Query parameters for speaker reads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerQuery {
    /// Eager-load each speaker's talks.
    #[serde(default)]
    pub include_talks: bool,
}

/// Load a speaker and check it belongs to the camp named in the path.
pub(crate) async fn speaker_in_camp(
    state: &AppState,
    moniker: &str,
    id: SpeakerId,
    include_talks: bool,
    operation: &'static str,
) -> Result<Speaker, ApiError> {
    let speaker = state
        .repo
        .speaker(id, include_talks)
        .await
        .map_err(|e| ApiError::fault(operation, "Could not load speaker", &e))?
        .ok_or_else(|| ApiError::NotFound(format!("Speaker {id} was not found")))?;

    if speaker.camp.moniker != moniker {
        return Err(ApiError::BadRequest(String::from(
            "Speaker and Camp do not match",
        )));
    }
    Ok(speaker)
}

/// Reject callers other than the speaker's owner.
pub(crate) fn ensure_owner(speaker: &Speaker, user: &CurrentUser) -> Result<(), ApiError> {
    if speaker.is_owned_by(user.user_name()) {
        Ok(())
    } else {
        tracing::warn!(
            speaker_id = %speaker.id,
            user = user.user_name(),
            "Rejected change by non-owner"
        );
        Err(ApiError::Forbidden)
    }
}

/// `GET /api/camps/{moniker}/speakers?includeTalks=`
pub async fn list_speakers(
    State(state): State<Arc<AppState>>,
    ApiPath(moniker): ApiPath<String>,
    Version(version): Version,
    ApiQuery(query): ApiQuery<SpeakerQuery>,
) -> Result<Json<SpeakerListing>, ApiError> {
    let speakers = state
        .repo
        .speakers_by_moniker(&moniker, query.include_talks)
        .await
        .map_err(|e| ApiError::fault("speakers.list", "Could not load speakers", &e))?;

    let links = state.links().await;
    Ok(Json(speaker_listing(version, &speakers, &links, Utc::now())))
}

/// `GET /api/camps/{moniker}/speakers/{speaker_id}?includeTalks=`
pub async fn get_speaker(
    State(state): State<Arc<AppState>>,
    ApiPath((moniker, id)): ApiPath<(String, i64)>,
    Version(_): Version,
    ApiQuery(query): ApiQuery<SpeakerQuery>,
) -> Result<Json<SpeakerModel>, ApiError> {
    let speaker = state
        .repo
        .speaker(SpeakerId(id), query.include_talks)
        .await
        .map_err(|e| ApiError::fault("speakers.get", "Could not load speaker", &e))?
        .ok_or_else(|| ApiError::NotFound(format!("Speaker {id} was not found")))?;

    if speaker.camp.moniker != moniker {
        return Err(ApiError::BadRequest(String::from(
            "Speaker not in specified Camp",
        )));
    }

    Ok(Json(to_speaker_model(&speaker, &state.links().await)))
}

/// `POST /api/camps/{moniker}/speakers`
pub async fn create_speaker(
    State(state): State<Arc<AppState>>,
    ApiPath(moniker): ApiPath<String>,
    Version(_): Version,
    user: CurrentUser,
    ValidJson(input): ValidJson<SpeakerInput>,
) -> Result<impl IntoResponse, ApiError> {
    const FAILED: &str = "Could not add new speaker";

    let camp = state
        .repo
        .camp_by_moniker(&moniker, false)
        .await
        .map_err(|e| ApiError::fault("speakers.create", FAILED, &e))?
        .ok_or_else(|| ApiError::BadRequest(String::from("Could not find Camp")))?;

    let account = state
        .repo
        .user(user.user_name())
        .await
        .map_err(|e| ApiError::fault("speakers.create", FAILED, &e))?;
    if account.is_none() {
        tracing::warn!(user = user.user_name(), "Token names an unknown user");
        return Err(ApiError::BadRequest(String::from(FAILED)));
    }

    let details = new_speaker_details(input).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let new_speaker = NewSpeaker {
        camp_id: camp.id,
        owner: user.user_name().to_owned(),
        details,
    };

    let id = state
        .repo
        .save_all(ChangeSet::new().with(Change::AddSpeaker(Box::new(new_speaker.clone()))))
        .await
        .map_err(|e| ApiError::fault("speakers.create", FAILED, &e))?
        .speaker()
        .ok_or_else(|| ApiError::BadRequest(String::from(FAILED)))?;

    let speaker = Speaker {
        id,
        camp: codecamp_types::CampRef {
            id: camp.id,
            moniker: camp.details.moniker,
        },
        owner: new_speaker.owner,
        details: new_speaker.details,
        talks: None,
    };
    let model = to_speaker_model(&speaker, &state.links().await);

    tracing::info!(speaker_id = %id, moniker = %speaker.camp.moniker, "Speaker created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, model.url.clone())],
        Json(model),
    ))
}

/// `PUT /api/camps/{moniker}/speakers/{speaker_id}`
pub async fn update_speaker(
    State(state): State<Arc<AppState>>,
    ApiPath((moniker, id)): ApiPath<(String, i64)>,
    Version(_): Version,
    user: CurrentUser,
    ValidJson(input): ValidJson<SpeakerInput>,
) -> Result<Json<SpeakerModel>, ApiError> {
    let mut speaker =
        speaker_in_camp(&state, &moniker, SpeakerId(id), false, "speakers.update").await?;
    ensure_owner(&speaker, &user)?;

    merge_speaker(&mut speaker.details, input);
    state
        .repo
        .save_all(
            ChangeSet::new().with(Change::UpdateSpeaker(
                speaker.id,
                Box::new(speaker.details.clone()),
            )),
        )
        .await
        .map_err(|e| ApiError::fault("speakers.update", "Could not update speaker", &e))?;

    Ok(Json(to_speaker_model(&speaker, &state.links().await)))
}

/// `DELETE /api/camps/{moniker}/speakers/{speaker_id}`
pub async fn delete_speaker(
    State(state): State<Arc<AppState>>,
    ApiPath((moniker, id)): ApiPath<(String, i64)>,
    Version(_): Version,
    user: CurrentUser,
) -> Result<StatusCode, ApiError> {
    let speaker =
        speaker_in_camp(&state, &moniker, SpeakerId(id), false, "speakers.delete").await?;
    ensure_owner(&speaker, &user)?;

    state
        .repo
        .save_all(ChangeSet::new().with(Change::DeleteSpeaker(speaker.id)))
        .await
        .map_err(|e| ApiError::fault("speakers.delete", "Could not delete speaker", &e))?;

    tracing::info!(speaker_id = %speaker.id, "Speaker deleted");
    Ok(StatusCode::OK)
}
