//! Code Camp API server binary.
//!
//! # Startup Sequence
//!
//! 1. Load layered configuration (`appsettings.toml`, environment overlay,
//!    `CODECAMP_` variables)
//! 2. Initialize structured logging (tracing)
//! 3. Select the store: PostgreSQL when `database.url` is set, otherwise
//!    the in-memory repository
//! 4. Apply migrations when enabled
//! 5. Seed the initial account and sample camp when enabled
//! 6. Serve HTTP until `Ctrl-C`

mod error;

use std::sync::Arc;

use codecamp_api::{AppState, ServerConfig, start_server};
use codecamp_core::config::{DatabaseSettings, LoggingSettings};
use codecamp_core::{ConfigSource, ConfigStore};
use codecamp_db::{CampRepository, MemoryRepository, PgRepository, PostgresPool, seed};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::StartupError;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let source = ConfigSource::from_env();
    let store = ConfigStore::open(source)?;
    let settings = store.current().await;

    init_tracing(&settings.logging)?;
    info!(
        config_dir = %store.source().directory().display(),
        public_url = %settings.server.public_url,
        "Configuration loaded"
    );

    let (repo, pool) = open_store(&settings.database).await?;

    if settings.seed.enabled {
        seed(repo.as_ref(), &settings.seed).await?;
    }

    let server_config = ServerConfig::from_settings(&settings.server);
    let state = Arc::new(AppState::new(repo, Arc::new(store)));
    let result = start_server(&server_config, state).await;

    if let Some(pool) = pool {
        pool.close().await;
    }

    result?;
    Ok(())
}

fn init_tracing(settings: &LoggingSettings) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| StartupError::Logging {
        message: e.to_string(),
    })
}

async fn open_store(
    settings: &DatabaseSettings,
) -> Result<(Arc<dyn CampRepository>, Option<PostgresPool>), StartupError> {
    let Some(url) = settings.url.as_deref() else {
        warn!("No database URL configured; using the in-memory store");
        return Ok((Arc::new(MemoryRepository::new()), None));
    };

    let pool = PostgresPool::connect(url, settings).await?;
    if settings.run_migrations {
        pool.run_migrations().await?;
    }
    let repo: Arc<dyn CampRepository> = Arc::new(PgRepository::new(&pool));
    Ok((repo, Some(pool)))
}
