//! # pf-config
//!
//! Layered runtime settings: built-in defaults, then an optional TOML file,
//! then `PINFLUENCE__SECTION__KEY` environment variables.

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an alternative settings file.
pub const CONFIG_PATH_VAR: &str = "PINFLUENCE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "pinfluence";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub geocoder: GeocoderSettings,
    pub indexer: IndexerSettings,
    pub admin: AdminSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx connection URL, e.g. `sqlite:pinfluence.db`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying agent
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexerSettings {
    /// Search index base URL. Without it, indexing only logs.
    pub url: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSettings {
    pub username: String,
    /// PHC-format Argon2 hash. Without it, every admin request is refused.
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
    pub json: bool,
}

impl Settings {
    /// Loads `.env`, then the file named by `PINFLUENCE_CONFIG` (or
    /// `pinfluence.toml` if present), then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let file = std::env::var(CONFIG_PATH_VAR).ok();
        Self::from_sources(file.as_deref())
    }

    pub fn from_sources(file: Option<&str>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:pinfluence.db")?
            .set_default("database.max_connections", 5)?
            .set_default("geocoder.base_url", "https://nominatim.openstreetmap.org")?
            .set_default("geocoder.user_agent", "pinfluence/0.1")?
            .set_default("geocoder.timeout_secs", 10)?
            .set_default("indexer.timeout_secs", 10)?
            .set_default("admin.username", "admin")?
            .set_default("log.filter", "info,pinfluence=debug,pf_core=debug")?
            .set_default("log.json", false)?
            .add_source(file_source)
            .add_source(
                Environment::with_prefix("PINFLUENCE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
