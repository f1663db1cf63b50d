//! Wire-facing request and response models.
//!
//! Response models are produced by the mapper in `codecamp-core` and
//! exported to `TypeScript` for API clients. Input models carry every field
//! as optional: on update, an absent or zero-valued field means "keep the
//! stored value".
//!
//! All JSON uses `camelCase` field names.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use validator::Validate;

use crate::ids::{SpeakerId, TalkId};

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an input timestamp.
///
/// Accepts a bare date (midnight), a local date-time with or without
/// seconds, or an RFC 3339 value with an offset, which is converted to UTC.
fn parse_input_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_utc());
    }
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_input_datetime(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date or time: '{raw}'")))
}

// ---------------------------------------------------------------------------
// Camps
// ---------------------------------------------------------------------------

/// A camp as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct CampModel {
    /// Canonical URL of this camp.
    pub url: String,
    /// Public slug.
    pub moniker: String,
    /// Display name.
    pub name: String,
    /// First day of the event.
    pub start_date: NaiveDateTime,
    /// Last day of the event, derived from start date and length.
    pub end_date: NaiveDateTime,
    /// Length in days.
    pub length: i32,
    /// Free-form description.
    pub description: String,
    /// First address line.
    pub location_address1: String,
    /// Second address line.
    pub location_address2: String,
    /// Third address line.
    pub location_address3: String,
    /// City or town.
    pub location_city_town: String,
    /// State or province.
    pub location_state_province: String,
    /// Postal code.
    pub location_postal_code: String,
    /// Country.
    pub location_country: String,
    /// Speakers, present only when requested with `includeSpeakers=true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speakers: Option<Vec<SpeakerModel>>,
}

/// Incoming camp fields for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CampInput {
    /// Public slug. Required on create.
    #[validate(length(max = 20))]
    pub moniker: Option<String>,
    /// Display name. Required on create.
    #[validate(length(max = 100))]
    pub name: Option<String>,
    /// First day of the event.
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub start_date: Option<NaiveDateTime>,
    /// Length in days.
    #[validate(range(min = 0, max = 365))]
    pub length: Option<i32>,
    /// Free-form description.
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    /// First address line.
    #[validate(length(max = 256))]
    pub location_address1: Option<String>,
    /// Second address line.
    #[validate(length(max = 256))]
    pub location_address2: Option<String>,
    /// Third address line.
    #[validate(length(max = 256))]
    pub location_address3: Option<String>,
    /// City or town.
    #[validate(length(max = 100))]
    pub location_city_town: Option<String>,
    /// State or province.
    #[validate(length(max = 100))]
    pub location_state_province: Option<String>,
    /// Postal code.
    #[validate(length(max = 20))]
    pub location_postal_code: Option<String>,
    /// Country.
    #[validate(length(max = 100))]
    pub location_country: Option<String>,
}

// ---------------------------------------------------------------------------
// Speakers
// ---------------------------------------------------------------------------

/// A speaker as returned by versions 1.0 and 1.1 of the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct SpeakerModel {
    /// Canonical URL of this speaker.
    pub url: String,
    /// Speaker id.
    pub id: SpeakerId,
    /// Full name.
    pub name: String,
    /// Employer or company.
    pub company_name: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Personal website.
    pub website_url: String,
    /// Twitter handle.
    pub twitter_name: String,
    /// GitHub account name.
    pub git_hub_name: String,
    /// Short biography.
    pub bio: String,
    /// Head shot image URL.
    pub head_shot_url: String,
    /// Talks, present only when requested with `includeTalks=true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talks: Option<Vec<TalkModel>>,
}

/// A speaker as returned by the version 2.0 listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct Speaker2Model {
    /// All version 1.x fields.
    #[serde(flatten)]
    pub speaker: SpeakerModel,
    /// Name as printed on the conference badge.
    pub badge_name: String,
}

/// Incoming speaker fields for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerInput {
    /// Full name. Required on create.
    #[validate(length(max = 100))]
    pub name: Option<String>,
    /// Employer or company.
    #[validate(length(max = 100))]
    pub company_name: Option<String>,
    /// Contact phone number.
    #[validate(length(max = 30))]
    pub phone_number: Option<String>,
    /// Personal website.
    #[validate(length(max = 256))]
    pub website_url: Option<String>,
    /// Twitter handle.
    #[validate(length(max = 50))]
    pub twitter_name: Option<String>,
    /// GitHub account name.
    #[validate(length(max = 50))]
    pub git_hub_name: Option<String>,
    /// Short biography.
    #[validate(length(max = 4096))]
    pub bio: Option<String>,
    /// Head shot image URL.
    #[validate(length(max = 256))]
    pub head_shot_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Talks
// ---------------------------------------------------------------------------

/// A talk as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct TalkModel {
    /// Canonical URL of this talk.
    pub url: String,
    /// Talk id.
    pub id: TalkId,
    /// Title.
    pub title: String,
    /// Abstract.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Track or category.
    pub category: String,
    /// Audience level.
    pub level: String,
    /// What attendees should know beforehand.
    pub prerequisites: String,
    /// Scheduled start.
    pub starting_time: NaiveDateTime,
    /// Room name.
    pub room: String,
}

/// Incoming talk fields for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TalkInput {
    /// Title. Required on create.
    #[validate(length(max = 100))]
    pub title: Option<String>,
    /// Abstract. Required on create.
    #[serde(rename = "abstract")]
    #[validate(length(max = 4096))]
    pub abstract_text: Option<String>,
    /// Track or category.
    #[validate(length(max = 50))]
    pub category: Option<String>,
    /// Audience level.
    #[validate(length(max = 20))]
    pub level: Option<String>,
    /// What attendees should know beforehand.
    #[validate(length(max = 1024))]
    pub prerequisites: Option<String>,
    /// Scheduled start.
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub starting_time: Option<NaiveDateTime>,
    /// Room name.
    #[validate(length(max = 50))]
    pub room: Option<String>,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Login credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CredentialModel {
    /// Account user name.
    #[validate(length(min = 1, max = 256))]
    pub user_name: String,
    /// Plain-text password.
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct TokenModel {
    /// Signed token to send as `Authorization: Bearer <token>`.
    pub token: String,
    /// Instant after which the token is rejected.
    pub expiration: DateTime<Utc>,
}
