//! Persistence-side entities owned by the repository.
//!
//! Entities split into a `*Details` struct (the mutable fields a client may
//! supply) and an identified wrapper carrying ids and relationships. New
//! rows are staged from the details alone; the store assigns the id.

use chrono::NaiveDateTime;

use crate::ids::{CampId, SpeakerId, TalkId, UserId};

// ---------------------------------------------------------------------------
// Camp
// ---------------------------------------------------------------------------

/// Postal location of a camp venue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// First address line.
    pub address1: String,
    /// Second address line.
    pub address2: String,
    /// Third address line.
    pub address3: String,
    /// City or town.
    pub city_town: String,
    /// State or province.
    pub state_province: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
}

/// Client-editable fields of a camp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampDetails {
    /// Globally unique slug used on public routes.
    pub moniker: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// First day of the event.
    pub event_date: NaiveDateTime,
    /// Length of the event in days.
    pub length: i32,
    /// Venue location.
    pub location: Location,
}

/// A persisted camp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Camp {
    /// Internal row id.
    pub id: CampId,
    /// Editable fields.
    pub details: CampDetails,
    /// Speakers; `None` unless eagerly loaded.
    pub speakers: Option<Vec<Speaker>>,
}

impl Camp {
    /// The camp's public moniker.
    pub fn moniker(&self) -> &str {
        &self.details.moniker
    }
}

/// Back-reference from a speaker to its camp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampRef {
    /// The camp's row id.
    pub id: CampId,
    /// The camp's moniker at load time.
    pub moniker: String,
}

// ---------------------------------------------------------------------------
// Speaker
// ---------------------------------------------------------------------------

/// Client-editable fields of a speaker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerDetails {
    /// Speaker's full name.
    pub name: String,
    /// Employer or company.
    pub company_name: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Personal website.
    pub website_url: String,
    /// Twitter handle without the leading `@`.
    pub twitter_name: String,
    /// GitHub account name.
    pub github_name: String,
    /// Short biography.
    pub bio: String,
    /// Head shot image URL.
    pub head_shot_url: String,
}

/// A persisted speaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speaker {
    /// Row id.
    pub id: SpeakerId,
    /// The camp this speaker presents at.
    pub camp: CampRef,
    /// User name of the account that created (and owns) this speaker.
    pub owner: String,
    /// Editable fields.
    pub details: SpeakerDetails,
    /// Talks; `None` unless eagerly loaded.
    pub talks: Option<Vec<Talk>>,
}

impl Speaker {
    /// Whether the given user owns this speaker record.
    pub fn is_owned_by(&self, user_name: &str) -> bool {
        self.owner == user_name
    }
}

/// A speaker staged for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpeaker {
    /// Camp the speaker belongs to.
    pub camp_id: CampId,
    /// User name of the creating account.
    pub owner: String,
    /// Editable fields.
    pub details: SpeakerDetails,
}

// ---------------------------------------------------------------------------
// Talk
// ---------------------------------------------------------------------------

/// Client-editable fields of a talk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TalkDetails {
    /// Talk title.
    pub title: String,
    /// Talk abstract.
    pub abstract_text: String,
    /// Track or category.
    pub category: String,
    /// Audience level (e.g. "100", "300").
    pub level: String,
    /// What attendees should know beforehand.
    pub prerequisites: String,
    /// Scheduled start.
    pub start_time: NaiveDateTime,
    /// Room name.
    pub room: String,
}

/// A persisted talk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Talk {
    /// Row id.
    pub id: TalkId,
    /// The presenting speaker.
    pub speaker_id: SpeakerId,
    /// Editable fields.
    pub details: TalkDetails,
}

/// A talk staged for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTalk {
    /// The presenting speaker.
    pub speaker_id: SpeakerId,
    /// Editable fields.
    pub details: TalkDetails,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Claim type marking a user as a super user.
pub const SUPER_USER_CLAIM: &str = "SuperUser";

/// Claim type marking a user as an administrator.
pub const IS_ADMIN_CLAIM: &str = "IsAdmin";

/// An attribute attached to an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Claim {
    /// Claim type, e.g. `SuperUser`.
    pub claim_type: String,
    /// Claim value, e.g. `True`.
    pub value: String,
}

impl Claim {
    /// Build a claim from a type and value.
    pub fn new(claim_type: &str, value: &str) -> Self {
        Self {
            claim_type: claim_type.to_owned(),
            value: value.to_owned(),
        }
    }
}

/// Profile and credential fields of a user account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDetails {
    /// Unique login name.
    pub user_name: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// PHC-format password hash.
    pub password_hash: String,
    /// Claims granted to the user.
    pub claims: Vec<Claim>,
}

/// A persisted user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampUser {
    /// Row id.
    pub id: UserId,
    /// Profile and credentials.
    pub details: UserDetails,
}
