// ------------------------------------------------------------
// Renderer entry point
// ------------------------------------------------------------
//
// Reads the Collection JSON produced by fetch-subnets and writes
// one Markdown profile per record. Purely local filesystem work,
// no network access, no async runtime.
//
// Exit status:
// - zero on completion
// - non-zero when the Collection file is missing or garbled, or
//   a profile cannot be written
//
use log::info;

use subnet_profiler::config::Config;
use subnet_profiler::renderer::{load_collection, render_all};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::load("config.json")?;
    let collection = load_collection(&config.output.collection)?;

    info!(
        "loaded collection: {} subnets, network {}, source {}",
        collection.total_count, collection.network, collection.source
    );

    let written = render_all(
        &collection,
        &config.output.profiles,
        &config.output.descriptions,
    )?;
    info!("wrote {written} profiles");

    Ok(())
}
