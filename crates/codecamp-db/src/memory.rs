//! In-process repository used when no database is configured, and by tests.
//!
//! All tables live in one [`MemoryState`] behind a `tokio` `RwLock`. A
//! change set is applied to a copy of the state, which replaces the shared
//! state only if every change succeeds.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use codecamp_types::{
    Camp, CampDetails, CampId, CampRef, CampUser, NewSpeaker, NewTalk, Speaker, SpeakerId, Talk,
    TalkId, UserDetails, UserId,
};

use crate::error::DbError;
use crate::repository::{CampRepository, Change, ChangeSet, Committed};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    camps: BTreeMap<CampId, CampDetails>,
    speakers: BTreeMap<SpeakerId, NewSpeaker>,
    talks: BTreeMap<TalkId, NewTalk>,
    users: BTreeMap<UserId, UserDetails>,
    last_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> Result<i64, DbError> {
        self.last_id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| DbError::Conflict(String::from("id sequence exhausted")))?;
        Ok(self.last_id)
    }

    fn camp_id_by_moniker(&self, moniker: &str) -> Option<CampId> {
        self.camps
            .iter()
            .find(|(_, c)| c.moniker == moniker)
            .map(|(id, _)| *id)
    }

    fn ensure_unique_moniker(&self, moniker: &str, except: Option<CampId>) -> Result<(), DbError> {
        match self.camp_id_by_moniker(moniker) {
            Some(id) if Some(id) != except => Err(DbError::Conflict(format!(
                "moniker '{moniker}' is already in use"
            ))),
            _ => Ok(()),
        }
    }

    fn talks_of(&self, speaker_id: SpeakerId) -> Vec<Talk> {
        self.talks
            .iter()
            .filter(|(_, t)| t.speaker_id == speaker_id)
            .map(|(id, t)| Talk {
                id: *id,
                speaker_id: t.speaker_id,
                details: t.details.clone(),
            })
            .collect()
    }

    fn load_speaker(&self, id: SpeakerId, row: &NewSpeaker, include_talks: bool) -> Speaker {
        let moniker = self
            .camps
            .get(&row.camp_id)
            .map(|c| c.moniker.clone())
            .unwrap_or_default();
        Speaker {
            id,
            camp: CampRef {
                id: row.camp_id,
                moniker,
            },
            owner: row.owner.clone(),
            details: row.details.clone(),
            talks: include_talks.then(|| self.talks_of(id)),
        }
    }

    fn speakers_of(&self, camp_id: CampId, include_talks: bool) -> Vec<Speaker> {
        self.speakers
            .iter()
            .filter(|(_, s)| s.camp_id == camp_id)
            .map(|(id, s)| self.load_speaker(*id, s, include_talks))
            .collect()
    }

    fn load_camp(&self, id: CampId, include_speakers: bool) -> Option<Camp> {
        self.camps.get(&id).map(|details| Camp {
            id,
            details: details.clone(),
            speakers: include_speakers.then(|| self.speakers_of(id, false)),
        })
    }

    fn apply(&mut self, change: Change, committed: &mut Committed) -> Result<(), DbError> {
        match change {
            Change::AddCamp(details) => {
                self.ensure_unique_moniker(&details.moniker, None)?;
                let id = CampId(self.next_id()?);
                self.camps.insert(id, *details);
                committed.camps.push(id);
            }
            Change::UpdateCamp(id, details) => {
                self.ensure_unique_moniker(&details.moniker, Some(id))?;
                let slot = self
                    .camps
                    .get_mut(&id)
                    .ok_or_else(|| DbError::Missing(format!("camp {id}")))?;
                *slot = *details;
            }
            Change::DeleteCamp(id) => {
                self.camps
                    .remove(&id)
                    .ok_or_else(|| DbError::Missing(format!("camp {id}")))?;
                let orphaned: Vec<SpeakerId> = self
                    .speakers
                    .iter()
                    .filter(|(_, s)| s.camp_id == id)
                    .map(|(sid, _)| *sid)
                    .collect();
                self.speakers.retain(|_, s| s.camp_id != id);
                self.talks.retain(|_, t| !orphaned.contains(&t.speaker_id));
            }
            Change::AddSpeaker(speaker) => {
                if !self.camps.contains_key(&speaker.camp_id) {
                    return Err(DbError::Missing(format!("camp {}", speaker.camp_id)));
                }
                if !self.users.values().any(|u| u.user_name == speaker.owner) {
                    return Err(DbError::Missing(format!("user '{}'", speaker.owner)));
                }
                let id = SpeakerId(self.next_id()?);
                self.speakers.insert(id, *speaker);
                committed.speakers.push(id);
            }
            Change::UpdateSpeaker(id, details) => {
                let slot = self
                    .speakers
                    .get_mut(&id)
                    .ok_or_else(|| DbError::Missing(format!("speaker {id}")))?;
                slot.details = *details;
            }
            Change::DeleteSpeaker(id) => {
                self.speakers
                    .remove(&id)
                    .ok_or_else(|| DbError::Missing(format!("speaker {id}")))?;
                self.talks.retain(|_, t| t.speaker_id != id);
            }
            Change::AddTalk(talk) => {
                if !self.speakers.contains_key(&talk.speaker_id) {
                    return Err(DbError::Missing(format!("speaker {}", talk.speaker_id)));
                }
                let id = TalkId(self.next_id()?);
                self.talks.insert(id, *talk);
                committed.talks.push(id);
            }
            Change::UpdateTalk(id, details) => {
                let slot = self
                    .talks
                    .get_mut(&id)
                    .ok_or_else(|| DbError::Missing(format!("talk {id}")))?;
                slot.details = *details;
            }
            Change::DeleteTalk(id) => {
                self.talks
                    .remove(&id)
                    .ok_or_else(|| DbError::Missing(format!("talk {id}")))?;
            }
            Change::AddUser(user) => {
                if self.users.values().any(|u| u.user_name == user.user_name) {
                    return Err(DbError::Conflict(format!(
                        "user '{}' already exists",
                        user.user_name
                    )));
                }
                let id = UserId(self.next_id()?);
                self.users.insert(id, *user);
                committed.users.push(id);
            }
        }
        Ok(())
    }
}

/// Repository that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampRepository for MemoryRepository {
    async fn all_camps(&self) -> Result<Vec<Camp>, DbError> {
        let state = self.state.read().await;
        let mut camps: Vec<Camp> = state
            .camps
            .keys()
            .filter_map(|id| state.load_camp(*id, false))
            .collect();
        camps.sort_by_key(|c| c.details.event_date);
        Ok(camps)
    }

    async fn camp(&self, id: CampId) -> Result<Option<Camp>, DbError> {
        Ok(self.state.read().await.load_camp(id, false))
    }

    async fn camp_by_moniker(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> Result<Option<Camp>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .camp_id_by_moniker(moniker)
            .and_then(|id| state.load_camp(id, include_speakers)))
    }

    async fn speakers_by_moniker(
        &self,
        moniker: &str,
        include_talks: bool,
    ) -> Result<Vec<Speaker>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .camp_id_by_moniker(moniker)
            .map(|id| state.speakers_of(id, include_talks))
            .unwrap_or_default())
    }

    async fn speaker(&self, id: SpeakerId, include_talks: bool) -> Result<Option<Speaker>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .speakers
            .get(&id)
            .map(|row| state.load_speaker(id, row, include_talks)))
    }

    async fn talks(&self, speaker_id: SpeakerId) -> Result<Vec<Talk>, DbError> {
        Ok(self.state.read().await.talks_of(speaker_id))
    }

    async fn talk(&self, id: TalkId) -> Result<Option<Talk>, DbError> {
        Ok(self.state.read().await.talks.get(&id).map(|t| Talk {
            id,
            speaker_id: t.speaker_id,
            details: t.details.clone(),
        }))
    }

    async fn user(&self, user_name: &str) -> Result<Option<CampUser>, DbError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .find(|(_, u)| u.user_name == user_name)
            .map(|(id, details)| CampUser {
                id: *id,
                details: details.clone(),
            }))
    }

    async fn save_all(&self, changes: ChangeSet) -> Result<Committed, DbError> {
        if changes.is_empty() {
            return Ok(Committed::default());
        }
        tracing::debug!(changes = changes.len(), "applying change set in memory");
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        let mut committed = Committed::default();
        for change in changes.into_changes() {
            staged.apply(change, &mut committed)?;
        }
        *state = staged;
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use codecamp_types::{SpeakerDetails, TalkDetails};

    use super::*;

    fn camp(moniker: &str) -> Box<CampDetails> {
        Box::new(CampDetails {
            moniker: moniker.to_owned(),
            name: format!("{moniker} camp"),
            length: 1,
            ..CampDetails::default()
        })
    }

    fn user(user_name: &str) -> Box<UserDetails> {
        Box::new(UserDetails {
            user_name: user_name.to_owned(),
            ..UserDetails::default()
        })
    }

    async fn seeded() -> (MemoryRepository, CampId, SpeakerId) {
        let repo = MemoryRepository::new();
        let camp_id = repo
            .save_all(
                ChangeSet::new()
                    .with(Change::AddUser(user("ada")))
                    .with(Change::AddCamp(camp("ATL"))),
            )
            .await
            .unwrap()
            .camp()
            .unwrap();
        let speaker_id = repo
            .save_all(ChangeSet::new().with(Change::AddSpeaker(Box::new(NewSpeaker {
                camp_id,
                owner: String::from("ada"),
                details: SpeakerDetails::default(),
            }))))
            .await
            .unwrap()
            .speaker()
            .unwrap();
        repo.save_all(ChangeSet::new().with(Change::AddTalk(Box::new(NewTalk {
            speaker_id,
            details: TalkDetails::default(),
        }))))
        .await
        .unwrap();
        (repo, camp_id, speaker_id)
    }

    #[tokio::test]
    async fn failed_change_rolls_back_whole_set() {
        let (repo, camp_id, _) = seeded().await;
        let result = repo
            .save_all(
                ChangeSet::new()
                    .with(Change::AddCamp(camp("NEW")))
                    .with(Change::DeleteCamp(CampId(9999))),
            )
            .await;
        assert!(matches!(result, Err(DbError::Missing(_))));
        assert!(repo.camp_by_moniker("NEW", false).await.unwrap().is_none());
        assert!(repo.camp(camp_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn speaker_owner_must_be_a_known_user() {
        let (repo, camp_id, _) = seeded().await;
        let stranger = NewSpeaker {
            camp_id,
            owner: String::from("nobody"),
            details: SpeakerDetails::default(),
        };

        let result = repo
            .save_all(ChangeSet::new().with(Change::AddSpeaker(Box::new(stranger.clone()))))
            .await;
        assert!(matches!(result, Err(DbError::Missing(_))));
        assert_eq!(repo.speakers_by_moniker("ATL", false).await.unwrap().len(), 1);

        let added = repo
            .save_all(
                ChangeSet::new()
                    .with(Change::AddUser(user("nobody")))
                    .with(Change::AddSpeaker(Box::new(stranger))),
            )
            .await
            .unwrap();
        assert_eq!(added.users.len(), 1);
        assert!(added.speaker().is_some());
    }

    #[tokio::test]
    async fn empty_change_set_commits_nothing() {
        let (repo, _, _) = seeded().await;
        let committed = repo.save_all(ChangeSet::new()).await.unwrap();
        assert_eq!(committed, Committed::default());
        assert_eq!(repo.all_camps().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_moniker_is_a_conflict() {
        let (repo, _, _) = seeded().await;
        let result = repo
            .save_all(ChangeSet::new().with(Change::AddCamp(camp("ATL"))))
            .await;
        assert!(matches!(result, Err(DbError::Conflict(_))));
    }

    #[tokio::test]
    async fn eager_loading_is_opt_in() {
        let (repo, _, speaker_id) = seeded().await;

        let lazy = repo.camp_by_moniker("ATL", false).await.unwrap().unwrap();
        assert!(lazy.speakers.is_none());
        let eager = repo.camp_by_moniker("ATL", true).await.unwrap().unwrap();
        assert_eq!(eager.speakers.unwrap().len(), 1);

        let speaker = repo.speaker(speaker_id, true).await.unwrap().unwrap();
        assert_eq!(speaker.camp.moniker, "ATL");
        assert_eq!(speaker.talks.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_camp_cascades() {
        let (repo, camp_id, speaker_id) = seeded().await;
        repo.save_all(ChangeSet::new().with(Change::DeleteCamp(camp_id)))
            .await
            .unwrap();
        assert!(repo.speaker(speaker_id, false).await.unwrap().is_none());
        assert!(repo.talks(speaker_id).await.unwrap().is_empty());
        assert!(repo.speakers_by_moniker("ATL", false).await.unwrap().is_empty());
    }
}
