use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guide_engine::config::Config;
use guide_engine::pipeline;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("starting guide annotation pipeline");

    let config = Config::from_env();
    pipeline::run(&config).context("pipeline failed")?;

    info!("pipeline finished");
    Ok(())
}
