use anyhow::Result;
use clap::Parser;

use officer_daemon::cli::DaemonCli;
use officer_daemon::logging;
use officer_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();
    let config = cli.load_config().await?;

    if cli.validate {
        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| anyhow::anyhow!("failed to render config: {}", e))?;
        println!("configuration is valid\n\n{rendered}");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "traefik-officer starting");

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await?;

    tracing::info!("traefik-officer shut down");
    Ok(())
}
