//! Data layer for the Code Camp API.
//!
//! Handlers talk to a [`CampRepository`] trait object. Two implementations
//! exist: [`PgRepository`] over a `PostgreSQL` pool, and
//! [`MemoryRepository`] for running without a database and for tests.
//!
//! # Architecture
//!
//! ```text
//! Handler
//!     |
//!     +-- reads ------------> CampRepository (Option / Vec results)
//!     |
//!     +-- ChangeSet --------> save_all (one transaction, all or nothing)
//! ```
//!
//! # Modules
//!
//! - [`repository`] -- The repository trait, change sets, and commit results
//! - [`postgres`] -- `PostgreSQL` connection pool
//! - [`pg_repository`] -- Repository backed by `PostgreSQL`
//! - [`memory`] -- Repository backed by process memory
//! - [`seed`] -- Initial account and sample data
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod pg_repository;
pub mod postgres;
pub mod repository;
pub mod seed;

// Re-export primary types for convenience.
pub use error::DbError;
pub use memory::MemoryRepository;
pub use pg_repository::PgRepository;
pub use postgres::PostgresPool;
pub use repository::{CampRepository, Change, ChangeSet, Committed};
pub use seed::{SeedReport, seed};
