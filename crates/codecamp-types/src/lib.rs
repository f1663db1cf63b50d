//! Shared type definitions for the Code Camp API.
//!
//! This crate is the single source of truth for the types used across the
//! workspace. Wire models flow downstream to `TypeScript` via `ts-rs` for
//! API clients.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for numeric row identifiers
//! - [`entities`] -- Persistence-side entities owned by the repository
//! - [`models`] -- Request and response models exchanged over HTTP

pub mod entities;
pub mod ids;
pub mod models;

// Re-export all public types at crate root for convenience.
pub use entities::{
    Camp, CampDetails, CampRef, CampUser, Claim, IS_ADMIN_CLAIM, Location, NewSpeaker, NewTalk,
    SUPER_USER_CLAIM, Speaker, SpeakerDetails, Talk, TalkDetails, UserDetails,
};
pub use ids::{CampId, SpeakerId, TalkId, UserId};
pub use models::{
    CampInput, CampModel, CredentialModel, Speaker2Model, SpeakerInput, SpeakerModel, TalkInput,
    TalkModel, TokenModel,
};
