use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vault_core::{Engine, EngineConfig, VaultResult};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "vaultd failed");
        std::process::exit(1);
    }
}

async fn run() -> VaultResult<()> {
    let config = EngineConfig::from_env()?;
    tracing::info!(
        vault = %config.vault_path.display(),
        index = %config.index_path.display(),
        "starting vaultd"
    );

    let mut engine = Engine::start(config).await?;

    let query: Vec<String> = std::env::args().skip(1).collect();
    if !query.is_empty() {
        let query = query.join(" ");
        for result in engine.search(&query, None).await? {
            println!("{:>8.3}  {}  {}", result.score, result.path, result.content_preview);
        }
        engine.shutdown().await;
        return Ok(());
    }

    tracing::info!("watching vault; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    engine.shutdown().await;
    Ok(())
}
