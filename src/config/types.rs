use serde::Deserialize;

/// Main configuration structure for Post-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub listing: ListingConfig,
    /// Sources in the order they are harvested
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

/// Crawl pacing and termination configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Consecutive pages without a newly inserted post before a source stops
    #[serde(
        rename = "duplicate-page-threshold",
        default = "default_duplicate_page_threshold"
    )]
    pub duplicate_page_threshold: u32,

    /// Fetch attempts per page before the page is abandoned
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait between failed attempts (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Wait after every successfully fetched page (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    /// How an abandoned page affects termination
    #[serde(rename = "failed-page-policy", default)]
    pub failed_page_policy: FailedPagePolicy,

    /// Consecutive abandoned pages that stop a source under `FailedPagePolicy::Ignore`
    #[serde(
        rename = "max-consecutive-failures",
        default = "default_max_consecutive_failures"
    )]
    pub max_consecutive_failures: u32,

    /// Last page number to fetch per source, if bounded
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,
}

/// Treatment of a page whose fetch attempts were all exhausted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailedPagePolicy {
    /// The page counts toward the duplicate streak, like a page of duplicates
    #[default]
    CountAsDuplicate,

    /// The page is skipped without touching the duplicate streak
    Ignore,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the harvester
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the harvester
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the harvester
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for harvester-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the last-run information file
    #[serde(rename = "scrape-info-path")]
    pub scrape_info_path: String,
}

/// Listing site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// Origin prepended to every relative article path
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// One listing feed
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Short name used in logs and run records
    pub name: String,

    /// Page URL with a `{page_num}` placeholder
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// Whether posts seen in this feed are marked featured
    #[serde(default)]
    pub featured: bool,
}

fn default_duplicate_page_threshold() -> u32 {
    3
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_page_delay_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_consecutive_failures() -> u32 {
    5
}
