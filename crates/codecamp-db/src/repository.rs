//! The repository contract shared by every store.
//!
//! Reads return `Ok(None)` (or an empty list) for absent rows. Writes are
//! staged into a [`ChangeSet`] and applied by [`CampRepository::save_all`]
//! as one unit: either every change lands or none does.

use async_trait::async_trait;
use codecamp_types::{
    Camp, CampDetails, CampId, CampUser, NewSpeaker, NewTalk, Speaker, SpeakerDetails, SpeakerId,
    Talk, TalkDetails, TalkId, UserDetails, UserId,
};

use crate::error::DbError;

/// A single staged mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Insert a camp.
    AddCamp(Box<CampDetails>),
    /// Replace a camp's editable fields.
    UpdateCamp(CampId, Box<CampDetails>),
    /// Delete a camp with its speakers and talks.
    DeleteCamp(CampId),
    /// Insert a speaker.
    AddSpeaker(Box<NewSpeaker>),
    /// Replace a speaker's editable fields.
    UpdateSpeaker(SpeakerId, Box<SpeakerDetails>),
    /// Delete a speaker with its talks.
    DeleteSpeaker(SpeakerId),
    /// Insert a talk.
    AddTalk(Box<NewTalk>),
    /// Replace a talk's editable fields.
    UpdateTalk(TalkId, Box<TalkDetails>),
    /// Delete a talk.
    DeleteTalk(TalkId),
    /// Insert a user account with its claims.
    AddUser(Box<UserDetails>),
}

/// An ordered unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// An empty unit of work.
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Stage a change.
    #[must_use]
    pub fn with(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    /// Stage a change in place.
    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of staged changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Consume the set, yielding changes in staging order.
    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}

/// Ids assigned by a committed unit of work, in staging order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Committed {
    /// Inserted camps.
    pub camps: Vec<CampId>,
    /// Inserted speakers.
    pub speakers: Vec<SpeakerId>,
    /// Inserted talks.
    pub talks: Vec<TalkId>,
    /// Inserted users.
    pub users: Vec<UserId>,
}

impl Committed {
    /// Id of the first inserted camp.
    pub fn camp(&self) -> Option<CampId> {
        self.camps.first().copied()
    }

    /// Id of the first inserted speaker.
    pub fn speaker(&self) -> Option<SpeakerId> {
        self.speakers.first().copied()
    }

    /// Id of the first inserted talk.
    pub fn talk(&self) -> Option<TalkId> {
        self.talks.first().copied()
    }
}

/// Persistence gateway for camps, speakers, talks, and users.
#[async_trait]
pub trait CampRepository: Send + Sync {
    /// Every camp, ordered by event date.
    async fn all_camps(&self) -> Result<Vec<Camp>, DbError>;

    /// A camp by its row id.
    async fn camp(&self, id: CampId) -> Result<Option<Camp>, DbError>;

    /// A camp by moniker, optionally with its speakers.
    async fn camp_by_moniker(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> Result<Option<Camp>, DbError>;

    /// Speakers of the camp with `moniker`, optionally with their talks.
    async fn speakers_by_moniker(
        &self,
        moniker: &str,
        include_talks: bool,
    ) -> Result<Vec<Speaker>, DbError>;

    /// A speaker by id, optionally with talks.
    async fn speaker(&self, id: SpeakerId, include_talks: bool) -> Result<Option<Speaker>, DbError>;

    /// Talks given by a speaker.
    async fn talks(&self, speaker_id: SpeakerId) -> Result<Vec<Talk>, DbError>;

    /// A talk by id.
    async fn talk(&self, id: TalkId) -> Result<Option<Talk>, DbError>;

    /// A user account by user name.
    async fn user(&self, user_name: &str) -> Result<Option<CampUser>, DbError>;

    /// Apply every staged change atomically.
    async fn save_all(&self, changes: ChangeSet) -> Result<Committed, DbError>;
}
