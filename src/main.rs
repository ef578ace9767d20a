use anyhow::Result;
use tracing::info;

mod api;
mod config;
mod models;
mod probes;
mod prometheus;
mod store;
mod summary;

use crate::config::MonitorConfig;
use crate::probes::ProbeSet;

#[tokio::main]
async fn main() -> Result<()> {
    let config = MonitorConfig::from_env();

    let level: tracing::Level = config.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_ansi(true)
        .init();

    info!("Starting monitoring server on port {}", config.port);

    let probes = ProbeSet::live(&config);
    api::serve(config, probes).await?;

    info!("Monitoring server stopped");
    Ok(())
}
