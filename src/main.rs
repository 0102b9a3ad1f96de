use std::sync::Arc;

use anyhow::Context;
use storefront::{
    api::start_api_server,
    auth::LogMailer,
    observability::{init_observability, log_config_info},
    startup::{build_services, grant_bootstrap_admin},
    storage::create_pool,
    AppConfig, APP_NAME, VERSION,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists; it must happen before any config is read
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_observability(&config.observability).await.context("failed to initialize observability")?;

    info!(app_name = APP_NAME, version = VERSION, "Starting storefront backend");
    log_config_info(&config);

    let pool = create_pool(&config.database).await.context("failed to open database")?;

    let services = build_services(&config, pool, Arc::new(LogMailer));
    grant_bootstrap_admin(services.users.as_ref())
        .await
        .context("failed to grant bootstrap admin")?;

    start_api_server(&config.server, services.api_state, services.mail)
        .await
        .context("API server failed")?;

    info!("Storefront backend stopped");
    Ok(())
}
