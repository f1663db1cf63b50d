//! [`CampRepository`] backed by `PostgreSQL`.
//!
//! Each [`ChangeSet`] runs inside one transaction. An update or delete that
//! matches no row aborts the transaction, as does any constraint violation.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{PgPool, Postgres, Transaction};

use codecamp_types::{
    Camp, CampDetails, CampId, CampRef, CampUser, Claim, Location, NewSpeaker, NewTalk, Speaker,
    SpeakerDetails, SpeakerId, Talk, TalkDetails, TalkId, UserDetails, UserId,
};

use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::repository::{CampRepository, Change, ChangeSet, Committed};

const CAMP_COLUMNS: &str = "id, moniker, name, description, event_date, length, address1, \
     address2, address3, city_town, state_province, postal_code, country";

const SPEAKER_SELECT: &str = "SELECT s.id, s.camp_id, c.moniker AS camp_moniker, s.owner, \
     s.name, s.company_name, s.phone_number, s.website_url, s.twitter_name, s.github_name, \
     s.bio, s.head_shot_url FROM speakers s JOIN camps c ON c.id = s.camp_id";

const TALK_COLUMNS: &str =
    "id, speaker_id, title, abstract, category, level, prerequisites, start_time, room";

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
struct CampRow {
    id: i64,
    moniker: String,
    name: String,
    description: String,
    event_date: NaiveDateTime,
    length: i32,
    address1: String,
    address2: String,
    address3: String,
    city_town: String,
    state_province: String,
    postal_code: String,
    country: String,
}

impl CampRow {
    fn into_camp(self) -> Camp {
        Camp {
            id: CampId(self.id),
            details: CampDetails {
                moniker: self.moniker,
                name: self.name,
                description: self.description,
                event_date: self.event_date,
                length: self.length,
                location: Location {
                    address1: self.address1,
                    address2: self.address2,
                    address3: self.address3,
                    city_town: self.city_town,
                    state_province: self.state_province,
                    postal_code: self.postal_code,
                    country: self.country,
                },
            },
            speakers: None,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SpeakerRow {
    id: i64,
    camp_id: i64,
    camp_moniker: String,
    owner: String,
    name: String,
    company_name: String,
    phone_number: String,
    website_url: String,
    twitter_name: String,
    github_name: String,
    bio: String,
    head_shot_url: String,
}

impl SpeakerRow {
    fn into_speaker(self) -> Speaker {
        Speaker {
            id: SpeakerId(self.id),
            camp: CampRef {
                id: CampId(self.camp_id),
                moniker: self.camp_moniker,
            },
            owner: self.owner,
            details: SpeakerDetails {
                name: self.name,
                company_name: self.company_name,
                phone_number: self.phone_number,
                website_url: self.website_url,
                twitter_name: self.twitter_name,
                github_name: self.github_name,
                bio: self.bio,
                head_shot_url: self.head_shot_url,
            },
            talks: None,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct TalkRow {
    id: i64,
    speaker_id: i64,
    title: String,
    #[sqlx(rename = "abstract")]
    abstract_text: String,
    category: String,
    level: String,
    prerequisites: String,
    start_time: NaiveDateTime,
    room: String,
}

impl TalkRow {
    fn into_talk(self) -> Talk {
        Talk {
            id: TalkId(self.id),
            speaker_id: SpeakerId(self.speaker_id),
            details: TalkDetails {
                title: self.title,
                abstract_text: self.abstract_text,
                category: self.category,
                level: self.level,
                prerequisites: self.prerequisites,
                start_time: self.start_time,
                room: self.room,
            },
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: i64,
    user_name: String,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
}

fn write_error(err: sqlx::Error) -> DbError {
    let classified = err.as_database_error().and_then(|db| {
        if db.is_unique_violation() {
            Some(DbError::Conflict(db.message().to_owned()))
        } else if db.is_foreign_key_violation() {
            Some(DbError::Missing(db.message().to_owned()))
        } else {
            None
        }
    });
    classified.unwrap_or_else(|| DbError::Postgres(err))
}

fn ensure_affected(rows: u64, what: String) -> Result<(), DbError> {
    if rows == 0 {
        Err(DbError::Missing(what))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Repository over a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Wrap a connected pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    async fn load_talks_into(&self, speakers: &mut [Speaker]) -> Result<(), DbError> {
        let ids: Vec<i64> = speakers.iter().map(|s| s.id.into_inner()).collect();
        let rows = sqlx::query_as::<_, TalkRow>(&format!(
            "SELECT {TALK_COLUMNS} FROM talks WHERE speaker_id = ANY($1) ORDER BY id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        for speaker in speakers.iter_mut() {
            speaker.talks = Some(Vec::new());
        }
        for talk in rows.into_iter().map(TalkRow::into_talk) {
            if let Some(list) = speakers
                .iter_mut()
                .find(|s| s.id == talk.speaker_id)
                .and_then(|s| s.talks.as_mut())
            {
                list.push(talk);
            }
        }
        Ok(())
    }

    async fn speakers_where(
        &self,
        clause: &str,
        bind: i64,
        include_talks: bool,
    ) -> Result<Vec<Speaker>, DbError> {
        let rows = sqlx::query_as::<_, SpeakerRow>(&format!(
            "{SPEAKER_SELECT} WHERE {clause} ORDER BY s.id"
        ))
        .bind(bind)
        .fetch_all(&self.pool)
        .await?;

        let mut speakers: Vec<Speaker> = rows.into_iter().map(SpeakerRow::into_speaker).collect();
        if include_talks && !speakers.is_empty() {
            self.load_talks_into(&mut speakers).await?;
        }
        Ok(speakers)
    }

    async fn apply(
        tx: &mut Transaction<'_, Postgres>,
        change: Change,
        committed: &mut Committed,
    ) -> Result<(), DbError> {
        match change {
            Change::AddCamp(d) => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO camps (moniker, name, description, event_date, length, \
                     address1, address2, address3, city_town, state_province, postal_code, country) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id",
                )
                .bind(&d.moniker)
                .bind(&d.name)
                .bind(&d.description)
                .bind(d.event_date)
                .bind(d.length)
                .bind(&d.location.address1)
                .bind(&d.location.address2)
                .bind(&d.location.address3)
                .bind(&d.location.city_town)
                .bind(&d.location.state_province)
                .bind(&d.location.postal_code)
                .bind(&d.location.country)
                .fetch_one(&mut **tx)
                .await
                .map_err(write_error)?;
                committed.camps.push(CampId(id));
            }
            Change::UpdateCamp(id, d) => {
                let result = sqlx::query(
                    "UPDATE camps SET moniker = $2, name = $3, description = $4, event_date = $5, \
                     length = $6, address1 = $7, address2 = $8, address3 = $9, city_town = $10, \
                     state_province = $11, postal_code = $12, country = $13 WHERE id = $1",
                )
                .bind(id.into_inner())
                .bind(&d.moniker)
                .bind(&d.name)
                .bind(&d.description)
                .bind(d.event_date)
                .bind(d.length)
                .bind(&d.location.address1)
                .bind(&d.location.address2)
                .bind(&d.location.address3)
                .bind(&d.location.city_town)
                .bind(&d.location.state_province)
                .bind(&d.location.postal_code)
                .bind(&d.location.country)
                .execute(&mut **tx)
                .await
                .map_err(write_error)?;
                ensure_affected(result.rows_affected(), format!("camp {id}"))?;
            }
            Change::DeleteCamp(id) => {
                let result = sqlx::query("DELETE FROM camps WHERE id = $1")
                    .bind(id.into_inner())
                    .execute(&mut **tx)
                    .await?;
                ensure_affected(result.rows_affected(), format!("camp {id}"))?;
            }
            Change::AddSpeaker(s) => {
                let NewSpeaker {
                    camp_id,
                    owner,
                    details: d,
                } = *s;
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO speakers (camp_id, owner, name, company_name, phone_number, \
                     website_url, twitter_name, github_name, bio, head_shot_url) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
                )
                .bind(camp_id.into_inner())
                .bind(&owner)
                .bind(&d.name)
                .bind(&d.company_name)
                .bind(&d.phone_number)
                .bind(&d.website_url)
                .bind(&d.twitter_name)
                .bind(&d.github_name)
                .bind(&d.bio)
                .bind(&d.head_shot_url)
                .fetch_one(&mut **tx)
                .await
                .map_err(write_error)?;
                committed.speakers.push(SpeakerId(id));
            }
            Change::UpdateSpeaker(id, d) => {
                let result = sqlx::query(
                    "UPDATE speakers SET name = $2, company_name = $3, phone_number = $4, \
                     website_url = $5, twitter_name = $6, github_name = $7, bio = $8, \
                     head_shot_url = $9 WHERE id = $1",
                )
                .bind(id.into_inner())
                .bind(&d.name)
                .bind(&d.company_name)
                .bind(&d.phone_number)
                .bind(&d.website_url)
                .bind(&d.twitter_name)
                .bind(&d.github_name)
                .bind(&d.bio)
                .bind(&d.head_shot_url)
                .execute(&mut **tx)
                .await?;
                ensure_affected(result.rows_affected(), format!("speaker {id}"))?;
            }
            Change::DeleteSpeaker(id) => {
                let result = sqlx::query("DELETE FROM speakers WHERE id = $1")
                    .bind(id.into_inner())
                    .execute(&mut **tx)
                    .await?;
                ensure_affected(result.rows_affected(), format!("speaker {id}"))?;
            }
            Change::AddTalk(t) => {
                let NewTalk {
                    speaker_id,
                    details: d,
                } = *t;
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO talks (speaker_id, title, abstract, category, level, \
                     prerequisites, start_time, room) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
                )
                .bind(speaker_id.into_inner())
                .bind(&d.title)
                .bind(&d.abstract_text)
                .bind(&d.category)
                .bind(&d.level)
                .bind(&d.prerequisites)
                .bind(d.start_time)
                .bind(&d.room)
                .fetch_one(&mut **tx)
                .await
                .map_err(write_error)?;
                committed.talks.push(TalkId(id));
            }
            Change::UpdateTalk(id, d) => {
                let result = sqlx::query(
                    "UPDATE talks SET title = $2, abstract = $3, category = $4, level = $5, \
                     prerequisites = $6, start_time = $7, room = $8 WHERE id = $1",
                )
                .bind(id.into_inner())
                .bind(&d.title)
                .bind(&d.abstract_text)
                .bind(&d.category)
                .bind(&d.level)
                .bind(&d.prerequisites)
                .bind(d.start_time)
                .bind(&d.room)
                .execute(&mut **tx)
                .await?;
                ensure_affected(result.rows_affected(), format!("talk {id}"))?;
            }
            Change::DeleteTalk(id) => {
                let result = sqlx::query("DELETE FROM talks WHERE id = $1")
                    .bind(id.into_inner())
                    .execute(&mut **tx)
                    .await?;
                ensure_affected(result.rows_affected(), format!("talk {id}"))?;
            }
            Change::AddUser(u) => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO users (user_name, first_name, last_name, email, password_hash) \
                     VALUES ($1, $2, $3, $4, $5) RETURNING id",
                )
                .bind(&u.user_name)
                .bind(&u.first_name)
                .bind(&u.last_name)
                .bind(&u.email)
                .bind(&u.password_hash)
                .fetch_one(&mut **tx)
                .await
                .map_err(write_error)?;

                for claim in &u.claims {
                    sqlx::query(
                        "INSERT INTO user_claims (user_id, claim_type, claim_value) \
                         VALUES ($1, $2, $3)",
                    )
                    .bind(id)
                    .bind(&claim.claim_type)
                    .bind(&claim.value)
                    .execute(&mut **tx)
                    .await?;
                }
                committed.users.push(UserId(id));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CampRepository for PgRepository {
    async fn all_camps(&self) -> Result<Vec<Camp>, DbError> {
        let rows = sqlx::query_as::<_, CampRow>(&format!(
            "SELECT {CAMP_COLUMNS} FROM camps ORDER BY event_date, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CampRow::into_camp).collect())
    }

    async fn camp(&self, id: CampId) -> Result<Option<Camp>, DbError> {
        let row = sqlx::query_as::<_, CampRow>(&format!(
            "SELECT {CAMP_COLUMNS} FROM camps WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CampRow::into_camp))
    }

    async fn camp_by_moniker(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> Result<Option<Camp>, DbError> {
        let row = sqlx::query_as::<_, CampRow>(&format!(
            "SELECT {CAMP_COLUMNS} FROM camps WHERE moniker = $1"
        ))
        .bind(moniker)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut camp) = row.map(CampRow::into_camp) else {
            return Ok(None);
        };
        if include_speakers {
            camp.speakers = Some(
                self.speakers_where("s.camp_id = $1", camp.id.into_inner(), false)
                    .await?,
            );
        }
        Ok(Some(camp))
    }

    async fn speakers_by_moniker(
        &self,
        moniker: &str,
        include_talks: bool,
    ) -> Result<Vec<Speaker>, DbError> {
        let camp_id: Option<(i64,)> = sqlx::query_as("SELECT id FROM camps WHERE moniker = $1")
            .bind(moniker)
            .fetch_optional(&self.pool)
            .await?;
        match camp_id {
            Some((id,)) => self.speakers_where("s.camp_id = $1", id, include_talks).await,
            None => Ok(Vec::new()),
        }
    }

    async fn speaker(&self, id: SpeakerId, include_talks: bool) -> Result<Option<Speaker>, DbError> {
        Ok(self
            .speakers_where("s.id = $1", id.into_inner(), include_talks)
            .await?
            .into_iter()
            .next())
    }

    async fn talks(&self, speaker_id: SpeakerId) -> Result<Vec<Talk>, DbError> {
        let rows = sqlx::query_as::<_, TalkRow>(&format!(
            "SELECT {TALK_COLUMNS} FROM talks WHERE speaker_id = $1 ORDER BY id"
        ))
        .bind(speaker_id.into_inner())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TalkRow::into_talk).collect())
    }

    async fn talk(&self, id: TalkId) -> Result<Option<Talk>, DbError> {
        let row = sqlx::query_as::<_, TalkRow>(&format!(
            "SELECT {TALK_COLUMNS} FROM talks WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TalkRow::into_talk))
    }

    async fn user(&self, user_name: &str) -> Result<Option<CampUser>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, user_name, first_name, last_name, email, password_hash \
             FROM users WHERE user_name = $1",
        )
        .bind(user_name)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user) = row else {
            return Ok(None);
        };

        let claims: Vec<(String, String)> = sqlx::query_as(
            "SELECT claim_type, claim_value FROM user_claims WHERE user_id = $1 ORDER BY id",
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(CampUser {
            id: UserId(user.id),
            details: UserDetails {
                user_name: user.user_name,
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                password_hash: user.password_hash,
                claims: claims
                    .into_iter()
                    .map(|(claim_type, value)| Claim { claim_type, value })
                    .collect(),
            },
        }))
    }

    async fn save_all(&self, changes: ChangeSet) -> Result<Committed, DbError> {
        if changes.is_empty() {
            return Ok(Committed::default());
        }
        tracing::debug!(changes = changes.len(), "committing change set");
        let mut tx = self.pool.begin().await?;
        let mut committed = Committed::default();
        for change in changes.into_changes() {
            Self::apply(&mut tx, change, &mut committed).await?;
        }
        tx.commit().await?;
        Ok(committed)
    }
}
