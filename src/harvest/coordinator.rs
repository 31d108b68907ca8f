//! Harvest coordinator - the I/O driver around the crawl decision
//!
//! This module runs the sources one after another. For each source it:
//! - Fetches the current page with bounded retry
//! - Normalizes every entry and merges it into the archive
//! - Feeds the page outcome to `decide` and follows the resulting state
//!
//! Everything is sequential; the only waits are retry backoff and the pacing
//! delay between pages.

use crate::config::Config;
use crate::harvest::fetcher::{build_http_client, fetch_page, FetchResult, RetryPolicy};
use crate::harvest::sources::{ListingSource, SourceSet};
use crate::output::{write_scrape_info, HarvestReport};
use crate::record::{normalize_entry, RawEntry};
use crate::state::{decide, CrawlState, NoveltyOutcome, PageOutcome, TerminationPolicy};
use crate::storage::{SourceRunRecord, SqliteStorage, Storage};
use crate::HarvestError;
use chrono::Local;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Config,
    sources: SourceSet,
    storage: SqliteStorage,
    client: Client,
    retry: RetryPolicy,
    policy: TerminationPolicy,
    page_delay: Duration,
    run_id: i64,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Opens the archive, builds the HTTP client and records a new run.
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `config_hash` - Hash of the configuration file, stored with the run
    pub fn new(config: Config, config_hash: &str) -> Result<Self, HarvestError> {
        let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let run_id = storage.create_run(config_hash)?;

        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;

        Ok(Self {
            sources: SourceSet::from_config(&config.sources),
            retry: RetryPolicy::from_config(&config.crawler),
            policy: TerminationPolicy::from_config(&config.crawler),
            page_delay: Duration::from_millis(config.crawler.page_delay_ms),
            config,
            storage,
            client,
            run_id,
        })
    }

    /// Replaces the source set, e.g. to harvest only some sources
    pub fn with_sources(mut self, sources: SourceSet) -> Self {
        self.sources = sources;
        self
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Runs every source to completion and writes the last-run file
    ///
    /// A storage failure aborts the run; the run is then marked failed and
    /// the error returned. Posts written before the failure stay stored.
    pub async fn run(&mut self) -> Result<HarvestReport, HarvestError> {
        tracing::info!(
            "Starting harvest run {} with {} source(s)",
            self.run_id,
            self.sources.len()
        );

        match self.harvest_all().await {
            Ok(report) => Ok(report),
            Err(e) => {
                if let Err(mark_err) = self.storage.fail_run(self.run_id) {
                    tracing::warn!("Could not mark run {} as failed: {}", self.run_id, mark_err);
                }
                Err(e)
            }
        }
    }

    async fn harvest_all(&mut self) -> Result<HarvestReport, HarvestError> {
        let sources = self.sources.clone();
        let mut records = Vec::with_capacity(sources.len());

        for source in &sources {
            let record = self.harvest_source(source).await?;
            self.storage.record_source_run(self.run_id, &record)?;
            records.push(record);
        }

        let total_posts = self.storage.count_posts()?;
        self.storage.complete_run(self.run_id, total_posts)?;

        let finished_at = Local::now().naive_local();
        let info_path = Path::new(&self.config.output.scrape_info_path);
        write_scrape_info(info_path, finished_at, total_posts)?;

        let report = HarvestReport {
            run_id: self.run_id,
            sources: records,
            total_posts,
            finished_at,
        };
        report.log();

        Ok(report)
    }

    /// Crawls one source until its state machine stops
    pub async fn harvest_source(
        &mut self,
        source: &ListingSource,
    ) -> Result<SourceRunRecord, HarvestError> {
        tracing::info!(
            "Harvesting source '{}'{}",
            source.name,
            if source.featured { " (featured)" } else { "" }
        );

        let mut state = CrawlState::new();
        let mut record = SourceRunRecord::new(&source.name, source.featured);

        while !state.is_stopped() {
            let page = state.page;
            let url = source.page_url(page);
            tracing::debug!("Fetching page {} of '{}': {}", page, source.name, url);

            let outcome = match fetch_page(&self.client, &url, &self.retry).await {
                FetchResult::Page { entries, .. } if entries.is_empty() => {
                    tracing::info!("No more posts found on page {}. Stopping.", page);
                    PageOutcome::Empty
                }
                FetchResult::Page { entries, .. } => {
                    let outcome = self.store_entries(&entries, source.featured)?;
                    tracing::info!("Retrieved data for page {}", page);
                    outcome
                }
                FetchResult::Failed {
                    attempts,
                    last_error,
                } => {
                    tracing::error!(
                        "Failed to retrieve data for page {} after {} attempts: {}",
                        page,
                        attempts,
                        last_error
                    );
                    record.failed_pages += 1;
                    PageOutcome::Failed
                }
            };

            record.pages_fetched += 1;
            if let PageOutcome::Fetched(tally) = outcome {
                record.inserted += tally.inserted;
                record.merged += tally.merged;
                record.skipped += tally.skipped;
            }

            state = decide(state, outcome, &self.policy);

            // Paced after every page, abandoned ones included
            if !state.is_stopped() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        record.stop_reason = state.stop_reason();
        if let Some(reason) = record.stop_reason {
            tracing::info!(
                "Stopping source '{}' after page {}: {} (duplicate streak {})",
                source.name,
                state.page,
                reason,
                state.duplicate_streak
            );
        }

        Ok(record)
    }

    /// Normalizes and merges every entry of one page
    fn store_entries(
        &mut self,
        entries: &[RawEntry],
        featured: bool,
    ) -> Result<PageOutcome, HarvestError> {
        let base_url = &self.config.listing.base_url;
        let mut outcomes = Vec::with_capacity(entries.len());

        for entry in entries {
            let post = normalize_entry(entry, base_url);
            let outcome = self.storage.upsert_post(&post, featured)?;

            match outcome {
                NoveltyOutcome::Inserted => tracing::info!(
                    "Inserted post - {}",
                    post.title.as_deref().unwrap_or(post.link.as_str())
                ),
                NoveltyOutcome::Merged => {
                    tracing::info!("Updated featured status for existing post - {}", post.link)
                }
                NoveltyOutcome::Skipped => tracing::debug!("Duplicate found for link: {}", post.link),
            }

            outcomes.push(outcome);
        }

        Ok(PageOutcome::from_outcomes(outcomes))
    }
}

/// Runs a complete harvest with the configured sources
///
/// # Example
///
/// ```no_run
/// use post_harvest::config::load_config_with_hash;
/// use post_harvest::harvest::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("harvest.toml"))?;
/// let report = run_harvest(config, &hash).await?;
/// println!("{} posts archived", report.total_posts);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config, config_hash: &str) -> Result<HarvestReport, HarvestError> {
    let mut coordinator = Coordinator::new(config, config_hash)?;
    coordinator.run().await
}
