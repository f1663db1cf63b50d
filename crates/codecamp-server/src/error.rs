//! Error types for the Code Camp server binary.

/// Top-level startup error.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: codecamp_core::ConfigError,
    },

    /// Connecting, migrating, or seeding the store failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: codecamp_db::DbError,
    },

    /// The HTTP listener failed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: codecamp_api::ServerError,
    },

    /// The tracing subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
