//! Type-safe identifier wrappers around database row ids.
//!
//! Every persisted entity has a strongly-typed numeric ID so a speaker id
//! can never be passed where a talk id is expected. Ids are assigned by
//! the store on commit; they are never generated app-side.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around an `i64` row id with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(#[ts(type = "number")] pub i64);

        impl $name {
            /// Return the inner row id.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Internal identifier of a camp. Public routes use the moniker instead.
    CampId
}

define_id! {
    /// Identifier of a speaker within the whole system (not per camp).
    SpeakerId
}

define_id! {
    /// Identifier of a talk.
    TalkId
}

define_id! {
    /// Identifier of an authenticated user account.
    UserId
}
