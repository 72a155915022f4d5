//! Backend entry-point: loads settings, wires the stores and serves the API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use foodshare::inbound::http::health::HealthState;
use foodshare::inbound::http::token_config::{BuildMode, token_settings_from_env};
use foodshare::outbound::persistence::{DbPool, run_migrations};
use foodshare::settings::ServerSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load server settings: {err}"))?;
    let token = token_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid token configuration")?;

    let bind_addr = settings.bind_addr()?;
    let mut config = ServerConfig::new(bind_addr, token)
        .with_store_timeout(settings.store_timeout()?)
        .with_account_policy(settings.account_policy());

    match settings.pool_config()? {
        Some(pool_config) => {
            run_migrations(pool_config.database_url()).await?;
            let pool = DbPool::new(pool_config)
                .await
                .wrap_err("failed to build database pool")?;
            config = config.with_db_pool(pool);
            info!("using PostgreSQL store");
        }
        None => warn!("FOODSHARE_DATABASE_URL not set; data is kept in memory"),
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting HTTP server");
    create_server(health_state, config)?.await?;
    Ok(())
}
