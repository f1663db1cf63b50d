//! Entity to wire-model mapping and the partial-merge rule for updates.
//!
//! Outgoing models gain computed fields (`endDate`, canonical `url`,
//! `badgeName`). Incoming models are merged field by field: a value that is
//! absent or equal to its type's zero value (empty string, `0`, the epoch
//! date) leaves the stored field untouched.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use codecamp_types::{
    Camp, CampDetails, CampInput, CampModel, Location, Speaker, Speaker2Model, SpeakerDetails,
    SpeakerId, SpeakerInput, SpeakerModel, Talk, TalkDetails, TalkId, TalkInput, TalkModel,
};

/// Errors raised while turning input models into entities.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// A field required on create was absent or empty.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A computed date fell outside the representable range.
    #[error("date is out of range")]
    DateOutOfRange,
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Builds canonical resource URLs from the public base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    base: String,
}

impl Links {
    /// Create a link builder rooted at `base` (trailing slashes ignored).
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    /// `/api/camps/{moniker}`
    pub fn camp(&self, moniker: &str) -> String {
        format!("{}/api/camps/{moniker}", self.base)
    }

    /// `/api/camps/{moniker}/speakers/{id}`
    pub fn speaker(&self, moniker: &str, id: SpeakerId) -> String {
        format!("{}/speakers/{id}", self.camp(moniker))
    }

    /// `/api/camps/{moniker}/speakers/{speaker_id}/talks/{id}`
    pub fn talk(&self, moniker: &str, speaker_id: SpeakerId, id: TalkId) -> String {
        format!("{}/talks/{id}", self.speaker(moniker, speaker_id))
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Overwrite `target` with `incoming` unless it is absent or a zero value.
pub fn merge_field<T: Default + PartialEq>(target: &mut T, incoming: Option<T>) {
    match incoming {
        Some(value) if value != T::default() => *target = value,
        _ => {}
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, MappingError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(MappingError::Missing(field)),
    }
}

// ---------------------------------------------------------------------------
// Camps
// ---------------------------------------------------------------------------

/// Last day of a camp: start date plus `length - 1` days.
pub fn camp_end_date(details: &CampDetails) -> Result<NaiveDateTime, MappingError> {
    let offset = TimeDelta::try_days(i64::from(details.length).saturating_sub(1))
        .ok_or(MappingError::DateOutOfRange)?;
    details
        .event_date
        .checked_add_signed(offset)
        .ok_or(MappingError::DateOutOfRange)
}

/// Whether `time` falls on one of the camp's days, from the start date up
/// to (not including) midnight after the last day.
pub fn camp_window_contains(
    details: &CampDetails,
    time: NaiveDateTime,
) -> Result<bool, MappingError> {
    let closes = camp_end_date(details)?
        .checked_add_signed(TimeDelta::days(1))
        .ok_or(MappingError::DateOutOfRange)?;
    Ok(details.event_date <= time && time < closes)
}

/// Map a camp (and any loaded speakers) to its wire model.
pub fn to_camp_model(camp: &Camp, links: &Links) -> Result<CampModel, MappingError> {
    let d = &camp.details;
    let speakers = camp.speakers.as_ref().map(|speakers| {
        speakers
            .iter()
            .map(|s| to_speaker_model(s, links))
            .collect::<Vec<_>>()
    });

    Ok(CampModel {
        url: links.camp(&d.moniker),
        moniker: d.moniker.clone(),
        name: d.name.clone(),
        start_date: d.event_date,
        end_date: camp_end_date(d)?,
        length: d.length,
        description: d.description.clone(),
        location_address1: d.location.address1.clone(),
        location_address2: d.location.address2.clone(),
        location_address3: d.location.address3.clone(),
        location_city_town: d.location.city_town.clone(),
        location_state_province: d.location.state_province.clone(),
        location_postal_code: d.location.postal_code.clone(),
        location_country: d.location.country.clone(),
        speakers,
    })
}

/// Build the details of a new camp. Moniker and name are required; the
/// start date defaults to `today` and the length to one day.
pub fn new_camp_details(input: CampInput, today: NaiveDate) -> Result<CampDetails, MappingError> {
    let moniker = required(input.moniker.clone(), "moniker")?;
    let name = required(input.name.clone(), "name")?;

    let mut details = CampDetails {
        moniker,
        name,
        event_date: today.and_time(NaiveTime::MIN),
        length: 1,
        ..CampDetails::default()
    };
    merge_camp(&mut details, input);
    Ok(details)
}

/// Apply an update to stored camp details.
pub fn merge_camp(target: &mut CampDetails, input: CampInput) {
    merge_field(&mut target.moniker, input.moniker);
    merge_field(&mut target.name, input.name);
    merge_field(&mut target.description, input.description);
    merge_field(&mut target.event_date, input.start_date);
    merge_field(&mut target.length, input.length);

    let Location {
        address1,
        address2,
        address3,
        city_town,
        state_province,
        postal_code,
        country,
    } = &mut target.location;
    merge_field(address1, input.location_address1);
    merge_field(address2, input.location_address2);
    merge_field(address3, input.location_address3);
    merge_field(city_town, input.location_city_town);
    merge_field(state_province, input.location_state_province);
    merge_field(postal_code, input.location_postal_code);
    merge_field(country, input.location_country);
}

// ---------------------------------------------------------------------------
// Speakers
// ---------------------------------------------------------------------------

/// Map a speaker (and any loaded talks) to its version 1.x model.
pub fn to_speaker_model(speaker: &Speaker, links: &Links) -> SpeakerModel {
    let d = &speaker.details;
    let moniker = &speaker.camp.moniker;
    SpeakerModel {
        url: links.speaker(moniker, speaker.id),
        id: speaker.id,
        name: d.name.clone(),
        company_name: d.company_name.clone(),
        phone_number: d.phone_number.clone(),
        website_url: d.website_url.clone(),
        twitter_name: d.twitter_name.clone(),
        git_hub_name: d.github_name.clone(),
        bio: d.bio.clone(),
        head_shot_url: d.head_shot_url.clone(),
        talks: speaker.talks.as_ref().map(|talks| {
            talks
                .iter()
                .map(|t| to_talk_model(t, moniker, links))
                .collect()
        }),
    }
}

/// Name printed on the badge: `"{name} (@{twitter})"`, or just the name.
pub fn badge_name(details: &SpeakerDetails) -> String {
    if details.twitter_name.is_empty() {
        details.name.clone()
    } else {
        format!("{} (@{})", details.name, details.twitter_name)
    }
}

/// Map a speaker to its version 2.0 model.
pub fn to_speaker2_model(speaker: &Speaker, links: &Links) -> Speaker2Model {
    Speaker2Model {
        speaker: to_speaker_model(speaker, links),
        badge_name: badge_name(&speaker.details),
    }
}

/// Build the details of a new speaker. Name is required.
pub fn new_speaker_details(input: SpeakerInput) -> Result<SpeakerDetails, MappingError> {
    let name = required(input.name.clone(), "name")?;
    let mut details = SpeakerDetails {
        name,
        ..SpeakerDetails::default()
    };
    merge_speaker(&mut details, input);
    Ok(details)
}

/// Apply an update to stored speaker details.
pub fn merge_speaker(target: &mut SpeakerDetails, input: SpeakerInput) {
    merge_field(&mut target.name, input.name);
    merge_field(&mut target.company_name, input.company_name);
    merge_field(&mut target.phone_number, input.phone_number);
    merge_field(&mut target.website_url, input.website_url);
    merge_field(&mut target.twitter_name, input.twitter_name);
    merge_field(&mut target.github_name, input.git_hub_name);
    merge_field(&mut target.bio, input.bio);
    merge_field(&mut target.head_shot_url, input.head_shot_url);
}

// ---------------------------------------------------------------------------
// Talks
// ---------------------------------------------------------------------------

/// Map a talk to its wire model. `moniker` is the owning camp's.
pub fn to_talk_model(talk: &Talk, moniker: &str, links: &Links) -> TalkModel {
    let d = &talk.details;
    TalkModel {
        url: links.talk(moniker, talk.speaker_id, talk.id),
        id: talk.id,
        title: d.title.clone(),
        abstract_text: d.abstract_text.clone(),
        category: d.category.clone(),
        level: d.level.clone(),
        prerequisites: d.prerequisites.clone(),
        starting_time: d.start_time,
        room: d.room.clone(),
    }
}

/// Build the details of a new talk. Title and abstract are required.
pub fn new_talk_details(input: TalkInput) -> Result<TalkDetails, MappingError> {
    let title = required(input.title.clone(), "title")?;
    let abstract_text = required(input.abstract_text.clone(), "abstract")?;
    let mut details = TalkDetails {
        title,
        abstract_text,
        ..TalkDetails::default()
    };
    merge_talk(&mut details, input);
    Ok(details)
}

/// Apply an update to stored talk details.
pub fn merge_talk(target: &mut TalkDetails, input: TalkInput) {
    merge_field(&mut target.title, input.title);
    merge_field(&mut target.abstract_text, input.abstract_text);
    merge_field(&mut target.category, input.category);
    merge_field(&mut target.level, input.level);
    merge_field(&mut target.prerequisites, input.prerequisites);
    merge_field(&mut target.start_time, input.starting_time);
    merge_field(&mut target.room, input.room);
}
