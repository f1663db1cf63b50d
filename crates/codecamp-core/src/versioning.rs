//! API version negotiation and per-version response shaping.
//!
//! Speaker and talk routes select a version from the `ver` request header.
//! Every version shares the same operations; the version only decides how
//! listings are wrapped and which talk-create rules apply.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use codecamp_types::{Speaker, Talk};

use crate::mapping::{Links, to_speaker_model, to_speaker2_model, to_talk_model};

/// Request header carrying the requested API version.
pub const VERSION_HEADER: &str = "ver";

/// Response header advertising the versions a route supports.
pub const SUPPORTED_VERSIONS_HEADER: &str = "api-supported-versions";

/// Value of [`SUPPORTED_VERSIONS_HEADER`].
pub const SUPPORTED_VERSIONS: &str = "1.0, 1.1, 2.0";

/// A supported API version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// Listings are bare arrays.
    V1_0,
    /// Listings are `{ count, results }`.
    #[default]
    V1_1,
    /// Speaker listings add `currentTime` and badge names; talk create
    /// checks the camp window.
    V2_0,
}

/// The requested version is malformed or not served.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported API version: {0}")]
pub struct UnsupportedVersion(pub String);

impl FromStr for ApiVersion {
    type Err = UnsupportedVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "1.0" => Ok(Self::V1_0),
            "1.1" => Ok(Self::V1_1),
            "2" | "2.0" => Ok(Self::V2_0),
            other => Err(UnsupportedVersion(other.to_owned())),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::V1_0 => "1.0",
            Self::V1_1 => "1.1",
            Self::V2_0 => "2.0",
        })
    }
}

impl ApiVersion {
    /// Resolve the header value; absent or blank selects the default.
    pub fn resolve(header: Option<&str>) -> Result<Self, UnsupportedVersion> {
        match header.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(value) => value.parse(),
        }
    }

    /// Which talk-create implementation serves this version.
    pub const fn talk_create(self) -> TalkCreate {
        match self {
            Self::V2_0 => TalkCreate::CampWindowChecked,
            Self::V1_0 | Self::V1_1 => TalkCreate::Unchecked,
        }
    }
}

/// Talk-create implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TalkCreate {
    /// Accept any starting time.
    Unchecked,
    /// Require the starting time to fall within the camp's days.
    CampWindowChecked,
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// A versioned collection response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    /// A plain JSON array.
    Bare(Vec<T>),
    /// `{ count, results }`
    Counted {
        /// Number of results.
        count: usize,
        /// The items.
        results: Vec<T>,
    },
    /// `{ currentTime, count, results }`
    #[serde(rename_all = "camelCase")]
    Stamped {
        /// Server time at which the listing was produced.
        current_time: DateTime<Utc>,
        /// Number of results.
        count: usize,
        /// The items.
        results: Vec<T>,
    },
}

impl<T> ListEnvelope<T> {
    /// `{ count, results }` with the count taken from the items.
    pub fn counted(results: Vec<T>) -> Self {
        Self::Counted {
            count: results.len(),
            results,
        }
    }
}

/// Serialized body of a speaker listing; items differ between versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SpeakerListing {
    /// Version 1.x items.
    V1(ListEnvelope<codecamp_types::SpeakerModel>),
    /// Version 2.0 items.
    V2(ListEnvelope<codecamp_types::Speaker2Model>),
}

/// Shape a speaker listing for `version`.
pub fn speaker_listing(
    version: ApiVersion,
    speakers: &[Speaker],
    links: &Links,
    now: DateTime<Utc>,
) -> SpeakerListing {
    match version {
        ApiVersion::V1_0 => SpeakerListing::V1(ListEnvelope::Bare(
            speakers.iter().map(|s| to_speaker_model(s, links)).collect(),
        )),
        ApiVersion::V1_1 => SpeakerListing::V1(ListEnvelope::counted(
            speakers.iter().map(|s| to_speaker_model(s, links)).collect(),
        )),
        ApiVersion::V2_0 => {
            let results: Vec<_> = speakers
                .iter()
                .map(|s| to_speaker2_model(s, links))
                .collect();
            SpeakerListing::V2(ListEnvelope::Stamped {
                current_time: now,
                count: results.len(),
                results,
            })
        }
    }
}

/// Shape a talk listing for `version`.
pub fn talk_listing(
    version: ApiVersion,
    talks: &[Talk],
    moniker: &str,
    links: &Links,
) -> ListEnvelope<codecamp_types::TalkModel> {
    let results = talks
        .iter()
        .map(|t| to_talk_model(t, moniker, links))
        .collect();
    match version {
        ApiVersion::V1_0 => ListEnvelope::Bare(results),
        ApiVersion::V1_1 | ApiVersion::V2_0 => ListEnvelope::counted(results),
    }
}
