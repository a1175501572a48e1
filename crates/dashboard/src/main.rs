use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod server;

use config::{DashboardConfig, OracleMode};
use server::DashboardState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashboard=info,rewards_sdk=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Soezliana rewards dashboard");

    dotenvy::dotenv().ok();
    let config = DashboardConfig::from_env()?;

    match config.oracle_mode {
        OracleMode::Cli => info!("Oracle: Solana CLI tools against {}", config.oracle.rpc_url),
        OracleMode::Simulated => info!("Oracle: simulated in-process ledger"),
    }
    info!("Treasury account: {}", config.treasury_account);
    info!("Listening on: {}:{}", config.host, config.port);

    let state = Arc::new(DashboardState::new(config)?);
    server::run(state).await?;
    Ok(())
}
