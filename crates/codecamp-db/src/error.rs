//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors and adds the repository's own consistency failures.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A change would violate a uniqueness rule (e.g. a duplicate moniker).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A change referenced a row that does not exist.
    #[error("Row not found: {0}")]
    Missing(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Seeding the initial data failed.
    #[error("Seed error: {0}")]
    Seed(String),
}
