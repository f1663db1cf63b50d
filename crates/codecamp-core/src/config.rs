//! Layered application settings and the reloadable configuration store.
//!
//! Settings are assembled from, in increasing precedence:
//!
//! 1. `appsettings.toml` in the configuration directory (required)
//! 2. `appsettings.{environment}.toml` (optional)
//! 3. `CODECAMP_*` environment variables, `__` separating sections
//!    (e.g. `CODECAMP_SERVER__PORT=9000`)
//! 4. `DATABASE_URL`, overriding `database.url`
//!
//! [`ConfigStore`] owns the current snapshot. A reload builds a complete
//! new [`AppSettings`] and swaps it in atomically; readers holding the old
//! `Arc` keep a consistent view.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, Environment, File};
use serde::Deserialize;
use tokio::sync::RwLock;

/// Base name of the settings files.
pub const SETTINGS_FILE_STEM: &str = "appsettings";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read, parsed, or deserialized.
    #[error("failed to load configuration: {source}")]
    Load {
        /// The underlying `config` crate error.
        #[from]
        source: config::ConfigError,
    },
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where settings are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    directory: PathBuf,
    environment: Option<String>,
}

impl ConfigSource {
    /// Read settings from `directory` with no environment overlay file.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            environment: None,
        }
    }

    /// Also layer `appsettings.{environment}.toml` over the base file.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Build a source from `CODECAMP_CONFIG_DIR` (default `.`) and
    /// `CODECAMP_ENVIRONMENT`.
    pub fn from_env() -> Self {
        let directory =
            std::env::var("CODECAMP_CONFIG_DIR").unwrap_or_else(|_| String::from("."));
        let source = Self::new(directory);
        match std::env::var("CODECAMP_ENVIRONMENT") {
            Ok(env) if !env.is_empty() => source.with_environment(env),
            _ => source,
        }
    }

    /// The configuration directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the required base file.
    pub fn base_file(&self) -> PathBuf {
        self.directory.join(format!("{SETTINGS_FILE_STEM}.toml"))
    }

    /// Path of the optional environment overlay, if an environment is set.
    pub fn environment_file(&self) -> Option<PathBuf> {
        self.environment
            .as_ref()
            .map(|env| self.directory.join(format!("{SETTINGS_FILE_STEM}.{env}.toml")))
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Top-level application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppSettings {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Bearer token and cookie settings.
    #[serde(default)]
    pub tokens: TokenSettings,

    /// Startup seeding of the initial user and sample camp.
    #[serde(default)]
    pub seed: SeedSettings,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppSettings {
    /// Load settings from every layer of `source`.
    pub fn load(source: &ConfigSource) -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::from(source.base_file()).required(true));

        if let Some(overlay) = source.environment_file() {
            builder = builder.add_source(File::from(overlay).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("CODECAMP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally visible base URL, used to build resource links.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    String::from("http://localhost:8080")
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseSettings {
    /// `PostgreSQL` URL. When absent the in-memory repository is used.
    #[serde(default)]
    pub url: Option<String>,

    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait when acquiring a connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Seconds an unused pooled connection may stay open.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Apply pending migrations at startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

const fn default_idle_timeout_secs() -> u64 {
    300
}

const fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            run_migrations: default_true(),
        }
    }
}

/// Bearer token and cookie settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenSettings {
    /// HMAC signing key.
    #[serde(default = "default_token_key")]
    pub key: String,

    /// Value of the `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Value of the `aud` claim.
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Token lifetime in minutes.
    #[serde(default = "default_lifetime_minutes")]
    pub lifetime_minutes: i64,

    /// Name of the authentication cookie set on login.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

fn default_token_key() -> String {
    String::from("change-me-this-key-is-for-local-development-only")
}

fn default_issuer() -> String {
    String::from("http://mycodecamp.local")
}

fn default_audience() -> String {
    String::from("http://mycodecamp.local")
}

const fn default_lifetime_minutes() -> i64 {
    15
}

fn default_cookie_name() -> String {
    String::from("codecamp_auth")
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            key: default_token_key(),
            issuer: default_issuer(),
            audience: default_audience(),
            lifetime_minutes: default_lifetime_minutes(),
            cookie_name: default_cookie_name(),
        }
    }
}

/// Startup seeding of the initial user and sample camp.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedSettings {
    /// Run the seeders at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// User name of the seeded account.
    #[serde(default = "default_seed_user_name")]
    pub user_name: String,

    /// Password of the seeded account.
    #[serde(default = "default_seed_password")]
    pub password: String,

    /// Given name of the seeded account.
    #[serde(default = "default_seed_first_name")]
    pub first_name: String,

    /// Family name of the seeded account.
    #[serde(default = "default_seed_last_name")]
    pub last_name: String,

    /// Email of the seeded account.
    #[serde(default = "default_seed_email")]
    pub email: String,
}

fn default_seed_user_name() -> String {
    String::from("s.gwozdz")
}

fn default_seed_password() -> String {
    String::from("PassW0RD!")
}

fn default_seed_first_name() -> String {
    String::from("Szymon")
}

fn default_seed_last_name() -> String {
    String::from("Gwozdz")
}

fn default_seed_email() -> String {
    String::from("test@test.com")
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            user_name: default_seed_user_name(),
            password: default_seed_password(),
            first_name: default_seed_first_name(),
            last_name: default_seed_last_name(),
            email: default_seed_email(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    String::from("info")
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Owned, reloadable handle to the current settings snapshot.
#[derive(Debug)]
pub struct ConfigStore {
    source: ConfigSource,
    current: RwLock<Arc<AppSettings>>,
}

impl ConfigStore {
    /// Load the initial snapshot from `source`.
    pub fn open(source: ConfigSource) -> Result<Self, ConfigError> {
        let settings = AppSettings::load(&source)?;
        Ok(Self::with_settings(source, settings))
    }

    /// Wrap an already-built snapshot. Later reloads read from `source`.
    pub fn with_settings(source: ConfigSource, settings: AppSettings) -> Self {
        Self {
            source,
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// The current snapshot.
    pub async fn current(&self) -> Arc<AppSettings> {
        Arc::clone(&*self.current.read().await)
    }

    /// Re-read every source and swap in the result.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn reload(&self) -> Result<Arc<AppSettings>, ConfigError> {
        let fresh = Arc::new(AppSettings::load(&self.source)?);
        *self.current.write().await = Arc::clone(&fresh);
        tracing::info!(directory = %self.source.directory().display(), "configuration reloaded");
        Ok(fresh)
    }

    /// Where this store reads from.
    pub const fn source(&self) -> &ConfigSource {
        &self.source
    }
}
