#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use lunar_bot::config;
use lunar_bot::errors::{Error, Result};
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration (config.toml + environment)
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Critical error loading application configuration: {e}"))?;

    // 4. The token is read directly before use and never stored in the config
    let token = env::var("Token")
        .or_else(|_| env::var("DISCORD_TOKEN"))
        .inspect_err(|e| error!("No bot token found in `Token` or `DISCORD_TOKEN`: {e}"))
        .map_err(Error::EnvVar)?;

    lunar_bot::bot::run_bot(token, app_config).await
}
