use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use tripgraph_core::graph::Neo4jStore;
use tripgraph_core::{run_with_retry, LoaderConfig, ZoneFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .json()
        .init();

    let config = LoaderConfig::default();
    info!(
        source = %config.source_path.display(),
        uri = %config.store.uri,
        max_attempts = config.retry.max_attempts,
        "starting trip graph load"
    );

    let store = Neo4jStore::new(config.store.clone());
    let summary = run_with_retry(&store, &config.source_path, ZoneFilter::bronx(), &config.retry)
        .await
        .context("trip graph load did not complete")?;

    info!(
        locations = summary.locations_upserted,
        trips = summary.trips_upserted,
        "trip graph load finished"
    );
    Ok(())
}

/// Attempt warnings must reach the log even without `RUST_LOG`, so the floor is `info`.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives.unwrap_or_default())
}
