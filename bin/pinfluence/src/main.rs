//! # Pinfluence Binary
//!
//! The entry point that assembles the application based on compile-time features.
//!
//! `pinfluence` serves the API; `pinfluence hash-password <password>` prints
//! an Argon2 hash for the `admin.password_hash` setting.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use pf_api::{build_router, AppState};
use pf_config::{LogSettings, Settings};
use pf_core::traits::{AuthProvider, InfluencerIndexer, LocationService, Repositories};
use tracing_subscriber::EnvFilter;

// Feature-gated imports: each port is filled by the plugin compiled in
#[cfg(feature = "db-sqlite")]
use pf_db_sqlite::SqliteStore;

#[cfg(feature = "geo-nominatim")]
use pf_geo_nominatim::NominatimLocator;

#[cfg(feature = "index-http")]
use pf_index_http::{HttpIndexer, LogIndexer};

#[cfg(feature = "auth-simple")]
use pf_auth_simple::SimpleAuthProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    #[cfg(feature = "auth-simple")]
    {
        if let [command, password] = args.as_slice() {
            if command == "hash-password" {
                println!("{}", pf_auth_simple::hash_password(password)?);
                return Ok(());
            }
        }
    }
    if !args.is_empty() {
        anyhow::bail!("usage: pinfluence [hash-password <password>]");
    }

    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log)?;

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repos = Repositories::from_store(
        SqliteStore::connect(&settings.database.url, settings.database.max_connections)
            .await
            .context("Failed to init SQLite")?,
    );

    // 2. Initialize Geocoder Implementation
    #[cfg(feature = "geo-nominatim")]
    let location_service: Arc<dyn LocationService> = Arc::new(NominatimLocator::new(
        &settings.geocoder.base_url,
        &settings.geocoder.user_agent,
        Duration::from_secs(settings.geocoder.timeout_secs),
    )?);

    // 3. Initialize Indexer Implementation
    #[cfg(feature = "index-http")]
    let indexer: Arc<dyn InfluencerIndexer> = match &settings.indexer.url {
        Some(url) => Arc::new(HttpIndexer::new(
            url,
            settings.indexer.api_key.clone(),
            Duration::from_secs(settings.indexer.timeout_secs),
        )?),
        None => Arc::new(LogIndexer),
    };

    // 4. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let auth: Arc<dyn AuthProvider> = Arc::new(SimpleAuthProvider::new(
        &settings.admin.username,
        settings.admin.password_hash.clone(),
    ));

    // 5. Wrap in AppState
    let state = Arc::new(AppState::new(repos, location_service, indexer, auth));
    let app = build_router(state);

    let addr = settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("🚀 Pinfluence starting on http://{addr}");
    tracing::info!("GraphiQL IDE available at http://{addr}/api");

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(log: &LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.filter))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
