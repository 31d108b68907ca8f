//! Post-Harvest main entry point
//!
//! This is the command-line interface for the incremental listing harvester.

use anyhow::Context;
use clap::Parser;
use post_harvest::config::{load_config_with_hash, Config, FailedPagePolicy};
use post_harvest::harvest::{harvest, user_agent_string, SourceSet};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Post-Harvest: an incremental listing harvester
///
/// Post-Harvest walks paginated listing feeds newest-first and merges every
/// post into a SQLite archive. Each feed stops once it has caught up with
/// content that is already stored, so re-runs only fetch what is new.
#[derive(Parser, Debug)]
#[command(name = "post-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Stop each source after this many pages
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: Option<u32>,

    /// Harvest only the named source (repeatable)
    #[arg(long = "source", value_name = "NAME")]
    sources: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = Some(max_pages);
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli.sources)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config, &config_hash, &cli.sources).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("post_harvest=info,warn"),
            1 => EnvFilter::new("post_harvest=debug,info"),
            2 => EnvFilter::new("post_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config, only: &[String]) -> anyhow::Result<()> {
    let sources = SourceSet::from_config(&config.sources).only(only)?;

    println!("=== Post-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Duplicate page threshold: {}",
        config.crawler.duplicate_page_threshold
    );
    println!("  Max attempts per page: {}", config.crawler.max_attempts);
    println!("  Retry backoff: {}ms", config.crawler.retry_backoff_ms);
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    match config.crawler.failed_page_policy {
        FailedPagePolicy::CountAsDuplicate => {
            println!("  Failed pages: counted as duplicate pages")
        }
        FailedPagePolicy::Ignore => println!(
            "  Failed pages: ignored, stop after {} in a row",
            config.crawler.max_consecutive_failures
        ),
    }
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages per source: {}", max),
        None => println!("  Max pages per source: unbounded"),
    }

    println!("\nUser Agent:");
    println!("  {}", user_agent_string(&config.user_agent));

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Scrape info: {}", config.output.scrape_info_path);

    println!("\nListing base URL: {}", config.listing.base_url);

    println!("\nSources in harvest order ({}):", sources.len());
    for source in &sources {
        println!(
            "  - {}{}",
            source.name,
            if source.featured { " (featured)" } else { "" }
        );
        println!("    * {}", source.page_url(1));
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use post_harvest::output::{load_statistics, print_statistics};
    use post_harvest::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("opening {}", config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, config_hash: &str, only: &[String]) -> anyhow::Result<()> {
    if only.is_empty() {
        tracing::info!("Harvesting all {} configured source(s)", config.sources.len());
    } else {
        tracing::info!("Harvesting selected source(s): {}", only.join(", "));
    }

    match harvest(config, config_hash, only).await {
        Ok(report) => {
            tracing::info!(
                "Harvest completed successfully: {} posts in database",
                report.total_posts
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
