// ------------------------------------------------------------
// Collector entry point
// ------------------------------------------------------------
//
// Run-to-completion batch job:
// - Load configuration (optional config.json, Finney defaults)
// - Open one session to the chain endpoint
// - Collect every registered subnet sequentially
// - Persist the Collection JSON, fully replacing the prior file
//
// Exit status:
// - zero on completion (including runs with per-subnet errors)
// - non-zero on fatal failure (no connection, enumeration or
//   write failure); the prior output file is left untouched
//
use chrono::Local;
use log::info;

use subnet_profiler::collector::collect_and_persist;
use subnet_profiler::config::Config;
use subnet_profiler::sources::SubtensorSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::load("config.json")?;
    info!(
        "connecting to {} network at {} (public data only)",
        config.network.name, config.network.endpoint
    );

    // Fatal if the endpoint is unreachable: no partial output.
    let source = SubtensorSource::connect(&config.network.endpoint).await?;

    let collection = collect_and_persist(
        &source,
        &config.network.name,
        &config.output.collection,
    )
    .await?;

    info!(
        "run finished at {}: {} subnets, {} errors, network {}, source {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        collection.total_count,
        collection.error_count(),
        collection.network,
        collection.source,
    );

    Ok(())
}
