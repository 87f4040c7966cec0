use anyhow::Context;
use airdrop_scanner_server::{run, Settings};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let settings = Settings::new().context("failed to parse config")?;
    run(settings)?.await?;
    Ok(())
}
