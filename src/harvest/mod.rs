//! Harvest module for listing retrieval and archive merging
//!
//! This module contains the I/O side of a harvest run, including:
//! - HTTP fetching of listing pages with bounded retry
//! - The ordered set of listing sources
//! - Per-source crawl coordination around the termination state machine

mod coordinator;
mod fetcher;
mod sources;

pub use coordinator::{run_harvest, Coordinator};
pub use fetcher::{
    build_http_client, fetch_page, user_agent_string, AttemptError, FetchResult, RetryPolicy,
};
pub use sources::{ListingSource, SourceSet};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete harvest, optionally restricted to some sources
///
/// This is the main entry point for starting a harvest. It will:
/// 1. Open the archive and record a new run
/// 2. Walk each selected source page by page until it stops
/// 3. Record per-source results and complete the run
/// 4. Write the last-run information file
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `config_hash` - Hash of the configuration file
/// * `only` - Source names to harvest; empty means all of them
pub async fn harvest(
    config: Config,
    config_hash: &str,
    only: &[String],
) -> Result<crate::output::HarvestReport, HarvestError> {
    let sources = SourceSet::from_config(&config.sources).only(only)?;
    let mut coordinator = Coordinator::new(config, config_hash)?.with_sources(sources);
    coordinator.run().await
}
