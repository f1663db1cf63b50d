//! HTTP API for the Code Camp conference service.
//!
//! Exposes camps, their speakers, and the speakers' talks over REST, with
//! sign-in, ownership checks on speaker and talk changes, and header-based
//! API versioning.
//!
//! # Modules
//!
//! - [`router`] -- Route table and middleware
//! - [`handlers`] -- Endpoint handlers
//! - [`extract`] -- Acting user, API version, and validated JSON extractors
//! - [`state`] -- Shared application state
//! - [`server`] -- Listener lifecycle
//! - [`error`] -- Error to response mapping

pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
