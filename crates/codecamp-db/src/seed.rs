//! Startup seeding of the initial account and a sample camp.
//!
//! Both seeders are idempotent: the user is created only when no account
//! with the configured name exists, and the sample camp only when the
//! store holds no camps at all.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use codecamp_core::config::SeedSettings;
use codecamp_core::identity::hash_password;
use codecamp_types::{
    CampDetails, Claim, IS_ADMIN_CLAIM, Location, NewSpeaker, NewTalk, SUPER_USER_CLAIM,
    SpeakerDetails, TalkDetails, UserDetails,
};

use crate::error::DbError;
use crate::repository::{CampRepository, Change, ChangeSet};

/// Moniker of the sample camp.
pub const SAMPLE_MONIKER: &str = "ATL2016";

/// What a seeding pass created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// The configured user was created.
    pub user_created: bool,
    /// The sample camp, speaker, and talks were created.
    pub sample_created: bool,
}

/// Run both seeders.
pub async fn seed(repo: &dyn CampRepository, settings: &SeedSettings) -> Result<SeedReport, DbError> {
    let user_created = seed_user(repo, settings).await?;
    let sample_created = seed_sample_camp(repo, &settings.user_name).await?;
    tracing::info!(user_created, sample_created, "Seeding finished");
    Ok(SeedReport {
        user_created,
        sample_created,
    })
}

/// Create the configured account with super-user and admin claims.
pub async fn seed_user(repo: &dyn CampRepository, settings: &SeedSettings) -> Result<bool, DbError> {
    if repo.user(&settings.user_name).await?.is_some() {
        return Ok(false);
    }

    let password_hash =
        hash_password(&settings.password).map_err(|e| DbError::Seed(e.to_string()))?;

    let user = UserDetails {
        user_name: settings.user_name.clone(),
        first_name: settings.first_name.clone(),
        last_name: settings.last_name.clone(),
        email: settings.email.clone(),
        password_hash,
        claims: vec![
            Claim::new(SUPER_USER_CLAIM, "True"),
            Claim::new(IS_ADMIN_CLAIM, "True"),
        ],
    };

    repo.save_all(ChangeSet::new().with(Change::AddUser(Box::new(user))))
        .await?;
    tracing::info!(user_name = %settings.user_name, "Seeded user account");
    Ok(true)
}

fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN))
}

/// Create a sample camp with one speaker and two talks when none exist.
pub async fn seed_sample_camp(repo: &dyn CampRepository, owner: &str) -> Result<bool, DbError> {
    if !repo.all_camps().await?.is_empty() {
        return Ok(false);
    }

    let day = NaiveDate::from_ymd_opt(2016, 10, 18)
        .ok_or_else(|| DbError::Seed(String::from("invalid sample date")))?;

    let camp = CampDetails {
        moniker: String::from(SAMPLE_MONIKER),
        name: String::from("Your First Code Camp"),
        description: String::from("This is the first code camp"),
        event_date: at(day, 0),
        length: 1,
        location: Location {
            address1: String::from("123 Main Street"),
            city_town: String::from("Atlanta"),
            state_province: String::from("GA"),
            postal_code: String::from("30303"),
            country: String::from("USA"),
            ..Location::default()
        },
    };
    let camp_id = repo
        .save_all(ChangeSet::new().with(Change::AddCamp(Box::new(camp))))
        .await?
        .camp()
        .ok_or_else(|| DbError::Seed(String::from("sample camp was not assigned an id")))?;

    let speaker = NewSpeaker {
        camp_id,
        owner: owner.to_owned(),
        details: SpeakerDetails {
            name: String::from("Shawn Wildermuth"),
            bio: String::from("I'm a speaker"),
            company_name: String::from("Wilder Minds LLC"),
            github_name: String::from("shawnwildermuth"),
            twitter_name: String::from("shawnwildermuth"),
            phone_number: String::from("555-1212"),
            head_shot_url: String::from("http://wilderminds.blob.core.windows.net/img/headshot.jpg"),
            website_url: String::from("http://wildermuth.com"),
        },
    };
    let speaker_id = repo
        .save_all(ChangeSet::new().with(Change::AddSpeaker(Box::new(speaker))))
        .await?
        .speaker()
        .ok_or_else(|| DbError::Seed(String::from("sample speaker was not assigned an id")))?;

    let talks = [
        TalkDetails {
            title: String::from("How to do ASP.NET Core"),
            abstract_text: String::from("How to do ASP.NET Core"),
            category: String::from("Web Development"),
            level: String::from("100"),
            prerequisites: String::from("C# Experience"),
            start_time: at(day, 14),
            room: String::from("Room 104"),
        },
        TalkDetails {
            title: String::from("How to do Bootstrap 4"),
            abstract_text: String::from("How to do Bootstrap 4"),
            category: String::from("Web Development"),
            level: String::from("100"),
            prerequisites: String::from("CSS Experience"),
            start_time: at(day, 13),
            room: String::from("Room 102"),
        },
    ];
    let mut changes = ChangeSet::new();
    for details in talks {
        changes.push(Change::AddTalk(Box::new(NewTalk {
            speaker_id,
            details,
        })));
    }
    repo.save_all(changes).await?;

    tracing::info!(moniker = SAMPLE_MONIKER, "Seeded sample camp");
    Ok(true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::memory::MemoryRepository;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let repo = MemoryRepository::new();
        let settings = SeedSettings::default();

        let first = seed(&repo, &settings).await.unwrap();
        assert!(first.user_created);
        assert!(first.sample_created);

        let second = seed(&repo, &settings).await.unwrap();
        assert_eq!(second, SeedReport::default());
    }

    #[tokio::test]
    async fn seeded_user_has_admin_claims_and_owns_sample_speaker() {
        let repo = MemoryRepository::new();
        let settings = SeedSettings::default();
        seed(&repo, &settings).await.unwrap();

        let user = repo.user(&settings.user_name).await.unwrap().unwrap();
        assert!(user.details.claims.contains(&Claim::new(SUPER_USER_CLAIM, "True")));
        assert!(user.details.claims.contains(&Claim::new(IS_ADMIN_CLAIM, "True")));

        let speakers = repo.speakers_by_moniker(SAMPLE_MONIKER, true).await.unwrap();
        assert_eq!(speakers.len(), 1);
        let speaker = speakers.first().unwrap();
        assert!(speaker.is_owned_by(&settings.user_name));
        assert_eq!(speaker.talks.as_ref().unwrap().len(), 2);
    }
}
