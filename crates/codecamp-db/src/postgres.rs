//! `PostgreSQL` pool setup.
//!
//! Pool sizing and timeouts come from the `[database]` settings section.
//! Queries are built at runtime, so compiling the workspace never needs a
//! reachable database.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use codecamp_core::config::DatabaseSettings;

use crate::error::DbError;

fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
}

/// Shared handle to the connection pool.
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Open a pool to `url`, sized and timed by `settings`.
    ///
    /// # Errors
    ///
    /// [`DbError::Config`] for an unparseable URL, [`DbError::Postgres`]
    /// when no connection can be established.
    pub async fn connect(url: &str, settings: &DatabaseSettings) -> Result<Self, DbError> {
        let target: PgConnectOptions = url
            .parse()
            .map_err(|e: sqlx::Error| DbError::Config(format!("Invalid database URL: {e}")))?;

        let options = pool_options(settings);
        let pool = options.connect_with(target).await?;

        tracing::info!(
            max_connections = settings.max_connections,
            idle_timeout_secs = settings.idle_timeout_secs,
            "Connected to PostgreSQL"
        );
        Ok(Self { pool })
    }

    /// Apply the schema migrations shipped with this crate.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations completed");
        Ok(())
    }

    /// The underlying [`PgPool`].
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}
