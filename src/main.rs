use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tiktok_harvest::RunConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let report = tiktok_harvest::run(RunConfig::default()).await?;

    info!(captures = report.captures.len(), "captures persisted");
    match &report.audio_artifact {
        Some(path) => info!(path = %path.display(), "challenge audio downloaded"),
        None => info!("no challenge audio artifact produced"),
    }
    info!(path = %report.state_artifact.display(), "session state saved");

    Ok(())
}
