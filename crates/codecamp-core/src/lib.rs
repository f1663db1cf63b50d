//! Application services shared by the Code Camp API and its server binary.
//!
//! Nothing in this crate touches HTTP or the database; it holds the rules
//! that the handlers and repositories apply.
//!
//! # Modules
//!
//! - [`config`] -- Layered settings and the reloadable configuration store
//! - [`mapping`] -- Entity to wire-model mapping and the partial-merge rule
//! - [`versioning`] -- `ver` header negotiation and per-version listings
//! - [`identity`] -- Password hashing and signed bearer tokens

pub mod config;
pub mod identity;
pub mod mapping;
pub mod versioning;

pub use config::{AppSettings, ConfigError, ConfigSource, ConfigStore};
pub use identity::{IdentityError, Principal, TokenService};
pub use mapping::{Links, MappingError};
pub use versioning::{ApiVersion, ListEnvelope, TalkCreate, UnsupportedVersion};
