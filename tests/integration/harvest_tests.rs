//! Integration tests for the harvester
//!
//! These tests use wiremock to serve listing pages and drive the real fetcher,
//! coordinator and SQLite archive end-to-end.

use post_harvest::config::{
    Config, CrawlerConfig, FailedPagePolicy, ListingConfig, OutputConfig, SourceEntry,
    UserAgentConfig,
};
use post_harvest::harvest::harvest;
use post_harvest::storage::{RunStatus, SqliteStorage, Storage};
use post_harvest::{HarvestError, StopReason};
use serde_json::{json, Value};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE_URL: &str = "https://www.example.com";

/// Creates a test configuration with one non-featured and one featured source
fn create_test_config(server_uri: &str, dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            duplicate_page_threshold: 3,
            max_attempts: 3,
            retry_backoff_ms: 0,
            page_delay_ms: 0,
            request_timeout_secs: 5,
            failed_page_policy: FailedPagePolicy::CountAsDuplicate,
            max_consecutive_failures: 5,
            max_pages: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: dir.join("Data").join("blogs.db").display().to_string(),
            scrape_info_path: dir.join("last_scrape_info.txt").display().to_string(),
        },
        listing: ListingConfig {
            base_url: BASE_URL.to_string(),
        },
        sources: vec![
            SourceEntry {
                name: "blogs".to_string(),
                url_template: format!("{}/blogs?page={{page_num}}", server_uri),
                featured: false,
            },
            SourceEntry {
                name: "featured".to_string(),
                url_template: format!("{}/featured-blogs?page={{page_num}}", server_uri),
                featured: true,
            },
        ],
    }
}

/// Restricts the config to the first source
fn blogs_only(mut config: Config) -> Config {
    config.sources.truncate(1);
    config
}

fn entry(slug: &str) -> Value {
    json!({
        "articleUrl": format!("/blogs/{}", slug),
        "articleName": format!("Post {}", slug),
        "contributors": [{ "name": "Ada Lovelace" }, { "name": "Grace Hopper" }],
        "date": "Mar 05, 2024",
        "articleSummary": "A short summary",
        "thumbnail": { "src": "https://img.example.com/cover.png" },
        "timeRead": "5 min read",
        "categoryName": "Design"
    })
}

fn listing(entries: Vec<Value>) -> Value {
    json!({ "template": { "contents": entries } })
}

fn link(slug: &str) -> String {
    format!("{}/blogs/{}", BASE_URL, slug)
}

/// Mounts a JSON listing for one page of a route
async fn mount_page(server: &MockServer, route: &str, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a page that must be requested exactly `times` times
async fn mount_page_expect(server: &MockServer, route: &str, page: u32, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Mounts a page that always answers with the given status
async fn mount_status(server: &MockServer, route: &str, page: u32, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

fn open_archive(config: &Config) -> SqliteStorage {
    SqliteStorage::new(Path::new(&config.output.database_path)).expect("Failed to open archive")
}

#[tokio::test]
async fn test_stops_three_pages_after_new_content() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = blogs_only(create_test_config(&server.uri(), dir.path()));

    mount_page_expect(&server, "/blogs", 1, listing(vec![entry("a"), entry("b")]), 1).await;
    mount_page_expect(&server, "/blogs", 2, listing(vec![entry("c"), entry("d")]), 1).await;
    for page in 3..=5 {
        mount_page_expect(&server, "/blogs", page, listing(vec![entry("a"), entry("b")]), 1).await;
    }
    mount_page_expect(&server, "/blogs", 6, listing(vec![entry("e")]), 0).await;

    let report = harvest(config.clone(), "hash", &[]).await.unwrap();

    let blogs = &report.sources[0];
    assert_eq!(blogs.pages_fetched, 5);
    assert_eq!(blogs.inserted, 4);
    assert_eq!(blogs.skipped, 6);
    assert_eq!(blogs.failed_pages, 0);
    assert_eq!(blogs.stop_reason, Some(StopReason::DuplicateStreak));
    assert_eq!(report.total_posts, 4);

    let archive = open_archive(&config);
    assert!(archive.get_post(&link("e")).unwrap().is_none());
}

#[tokio::test]
async fn test_empty_first_page_stops_immediately() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = blogs_only(create_test_config(&server.uri(), dir.path()));

    mount_page_expect(&server, "/blogs", 1, listing(vec![]), 1).await;
    mount_page_expect(&server, "/blogs", 2, listing(vec![entry("a")]), 0).await;

    let report = harvest(config, "hash", &[]).await.unwrap();

    assert_eq!(report.sources[0].pages_fetched, 1);
    assert_eq!(report.sources[0].stop_reason, Some(StopReason::Exhausted));
    assert_eq!(report.total_posts, 0);
}

#[tokio::test]
async fn test_missing_contents_is_an_empty_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = blogs_only(create_test_config(&server.uri(), dir.path()));

    mount_page_expect(&server, "/blogs", 1, json!({ "template": {} }), 1).await;

    let report = harvest(config, "hash", &[]).await.unwrap();
    assert_eq!(report.sources[0].stop_reason, Some(StopReason::Exhausted));
    assert_eq!(report.sources[0].failed_pages, 0);
}

#[tokio::test]
async fn test_failed_page_is_retried_then_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = blogs_only(create_test_config(&server.uri(), dir.path()));

    mount_status(&server, "/blogs", 1, 500, 3).await;
    mount_page_expect(&server, "/blogs", 2, listing(vec![entry("a")]), 1).await;
    mount_page_expect(&server, "/blogs", 3, listing(vec![]), 1).await;

    let report = harvest(config.clone(), "hash", &[]).await.unwrap();

    let blogs = &report.sources[0];
    assert_eq!(blogs.failed_pages, 1);
    assert_eq!(blogs.pages_fetched, 3);
    assert_eq!(blogs.inserted, 1);
    assert_eq!(blogs.stop_reason, Some(StopReason::Exhausted));

    let run = open_archive(&config).get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_undecodable_body_counts_as_failed_attempt() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = blogs_only(create_test_config(&server.uri(), dir.path()));
    config.crawler.max_attempts = 2;

    Mock::given(method("GET"))
        .and(path("/blogs"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(2)
        .mount(&server)
        .await;
    mount_page_expect(&server, "/blogs", 2, listing(vec![]), 1).await;

    let report = harvest(config, "hash", &[]).await.unwrap();
    assert_eq!(report.sources[0].failed_pages, 1);
    assert_eq!(report.sources[0].stop_reason, Some(StopReason::Exhausted));
}

#[tokio::test]
async fn test_failed_pages_count_toward_duplicate_streak() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = blogs_only(create_test_config(&server.uri(), dir.path()));
    config.crawler.max_attempts = 1;

    mount_page_expect(&server, "/blogs", 1, listing(vec![entry("a")]), 1).await;
    for page in 2..=4 {
        mount_status(&server, "/blogs", page, 503, 1).await;
    }
    mount_page_expect(&server, "/blogs", 5, listing(vec![entry("b")]), 0).await;

    let report = harvest(config, "hash", &[]).await.unwrap();
    assert_eq!(report.sources[0].failed_pages, 3);
    assert_eq!(
        report.sources[0].stop_reason,
        Some(StopReason::DuplicateStreak)
    );
}

#[tokio::test]
async fn test_ignore_policy_stops_on_failure_streak() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = blogs_only(create_test_config(&server.uri(), dir.path()));
    config.crawler.max_attempts = 1;
    config.crawler.failed_page_policy = FailedPagePolicy::Ignore;
    config.crawler.max_consecutive_failures = 2;

    mount_page_expect(&server, "/blogs", 1, listing(vec![entry("a")]), 1).await;
    mount_page_expect(&server, "/blogs", 2, listing(vec![entry("a")]), 1).await;
    mount_status(&server, "/blogs", 3, 500, 1).await;
    mount_status(&server, "/blogs", 4, 500, 1).await;
    mount_page_expect(&server, "/blogs", 5, listing(vec![entry("b")]), 0).await;

    let report = harvest(config, "hash", &[]).await.unwrap();
    let blogs = &report.sources[0];
    assert_eq!(blogs.pages_fetched, 4);
    assert_eq!(blogs.failed_pages, 2);
    assert_eq!(blogs.stop_reason, Some(StopReason::FailureStreak));
}

#[tokio::test]
async fn test_max_pages_bounds_each_source() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.max_pages = Some(2);

    mount_page_expect(&server, "/blogs", 1, listing(vec![entry("a")]), 1).await;
    mount_page_expect(&server, "/blogs", 2, listing(vec![entry("b")]), 1).await;
    mount_page_expect(&server, "/blogs", 3, listing(vec![entry("c")]), 0).await;
    mount_page_expect(&server, "/featured-blogs", 1, listing(vec![entry("x")]), 1).await;
    mount_page_expect(&server, "/featured-blogs", 2, listing(vec![entry("y")]), 1).await;
    mount_page_expect(&server, "/featured-blogs", 3, listing(vec![entry("z")]), 0).await;

    let report = harvest(config, "hash", &[]).await.unwrap();
    for source in &report.sources {
        assert_eq!(source.pages_fetched, 2);
        assert_eq!(source.stop_reason, Some(StopReason::PageLimit));
    }
    assert_eq!(report.total_posts, 4);
}

#[tokio::test]
async fn test_featured_source_merges_flag() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    mount_page(&server, "/blogs", 1, listing(vec![entry("a"), entry("b")])).await;
    mount_page(&server, "/blogs", 2, listing(vec![])).await;
    mount_page(&server, "/featured-blogs", 1, listing(vec![entry("b"), entry("c")])).await;
    mount_page(&server, "/featured-blogs", 2, listing(vec![])).await;

    let report = harvest(config.clone(), "hash", &[]).await.unwrap();

    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.sources[0].source, "blogs");
    assert_eq!(report.sources[0].inserted, 2);
    assert_eq!(report.sources[1].source, "featured");
    assert_eq!(report.sources[1].inserted, 1);
    assert_eq!(report.sources[1].merged, 1);
    assert_eq!(report.total_posts, 3);

    let archive = open_archive(&config);
    assert!(!archive.get_post(&link("a")).unwrap().unwrap().featured);
    assert!(archive.get_post(&link("b")).unwrap().unwrap().featured);
    assert!(archive.get_post(&link("c")).unwrap().unwrap().featured);
    assert_eq!(archive.count_featured_posts().unwrap(), 2);

    let run = archive.get_latest_run().unwrap().unwrap();
    let source_runs = archive.get_source_runs(run.id).unwrap();
    assert_eq!(source_runs, report.sources);
}

#[tokio::test]
async fn test_stored_post_is_normalized() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = blogs_only(create_test_config(&server.uri(), dir.path()));

    let sparse = json!({
        "articleUrl": "/blogs/sparse",
        "articleName": "Line one\nline\u{200b} two",
        "contributors": [{ "name": "Solo" }, {}],
        "date": "sometime last spring"
    });
    mount_page(&server, "/blogs", 1, listing(vec![entry("a"), sparse])).await;
    mount_page(&server, "/blogs", 2, listing(vec![])).await;

    harvest(config.clone(), "hash", &[]).await.unwrap();
    let archive = open_archive(&config);

    let full = archive.get_post(&link("a")).unwrap().unwrap();
    assert_eq!(full.title.as_deref(), Some("Post a"));
    assert_eq!(full.authors, "Ada Lovelace, Grace Hopper");
    assert_eq!(full.date.as_deref(), Some("2024-03-05"));
    assert_eq!(full.summary.as_deref(), Some("A short summary"));
    assert_eq!(
        full.thumbnail.as_deref(),
        Some("https://img.example.com/cover.png")
    );
    assert_eq!(full.time_to_read.as_deref(), Some("5 min read"));
    assert_eq!(full.category_name.as_deref(), Some("Design"));

    let sparse = archive.get_post(&link("sparse")).unwrap().unwrap();
    assert_eq!(sparse.title.as_deref(), Some("Line oneline two"));
    assert_eq!(sparse.authors, "Solo");
    assert_eq!(sparse.date, None);
    assert_eq!(sparse.summary.as_deref(), Some("N/A"));
    assert_eq!(sparse.thumbnail, None);
    assert_eq!(sparse.category_name.as_deref(), Some("N/A"));
    assert_eq!(archive.count_undated_posts().unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_links_within_page_store_one_row() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = blogs_only(create_test_config(&server.uri(), dir.path()));

    mount_page(&server, "/blogs", 1, listing(vec![entry("a"), entry("a"), entry("b")])).await;
    mount_page(&server, "/blogs", 2, listing(vec![])).await;

    let report = harvest(config, "hash", &[]).await.unwrap();
    assert_eq!(report.sources[0].inserted, 2);
    assert_eq!(report.sources[0].skipped, 1);
    assert_eq!(report.total_posts, 2);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    mount_page(&server, "/blogs", 1, listing(vec![entry("a"), entry("b")])).await;
    mount_page(&server, "/blogs", 2, listing(vec![entry("c")])).await;
    mount_page(&server, "/blogs", 3, listing(vec![])).await;
    mount_page(&server, "/featured-blogs", 1, listing(vec![entry("b")])).await;
    mount_page(&server, "/featured-blogs", 2, listing(vec![])).await;

    let first = harvest(config.clone(), "hash", &[]).await.unwrap();
    let before = open_archive(&config).get_post(&link("b")).unwrap();

    let second = harvest(config.clone(), "hash", &[]).await.unwrap();
    let after = open_archive(&config).get_post(&link("b")).unwrap();

    assert_eq!(first.total_posts, 3);
    assert_eq!(second.total_posts, 3);
    assert_eq!(second.total_inserted(), 0);
    assert_eq!(second.total_merged(), 0);
    assert_eq!(before, after);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_scrape_info_written_after_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = blogs_only(create_test_config(&server.uri(), dir.path()));

    mount_page(&server, "/blogs", 1, listing(vec![entry("a"), entry("b")])).await;
    mount_page(&server, "/blogs", 2, listing(vec![])).await;

    harvest(config.clone(), "hash", &[]).await.unwrap();

    let info = std::fs::read_to_string(&config.output.scrape_info_path).unwrap();
    assert!(info.starts_with("Last updated on: "));
    assert!(info.ends_with(". Total posts in database: 2.\n"));
    assert_eq!(info.lines().count(), 1);
}

#[tokio::test]
async fn test_source_filter_harvests_only_named_source() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    mount_page_expect(&server, "/blogs", 1, listing(vec![entry("a")]), 0).await;
    mount_page_expect(&server, "/featured-blogs", 1, listing(vec![entry("b")]), 1).await;
    mount_page_expect(&server, "/featured-blogs", 2, listing(vec![]), 1).await;

    let report = harvest(config, "hash", &["featured".to_string()]).await.unwrap();
    assert_eq!(report.sources.len(), 1);
    assert_eq!(report.sources[0].source, "featured");
    assert_eq!(report.total_posts, 1);
}

#[tokio::test]
async fn test_unknown_source_is_rejected_before_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let result = harvest(config.clone(), "hash", &["nope".to_string()]).await;
    assert!(matches!(result, Err(HarvestError::Config(_))));
    assert!(!Path::new(&config.output.database_path).exists());
}

#[tokio::test]
async fn test_odd_entries_do_not_cost_the_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = blogs_only(create_test_config(&server.uri(), dir.path()));

    let mut no_thumb = entry("no-thumb");
    no_thumb["thumbnail"] = json!(false);
    let mut empty_thumb = entry("empty-thumb");
    empty_thumb["thumbnail"] = json!("");
    let mut odd_authors = entry("odd-authors");
    odd_authors["contributors"] = Value::Null;

    mount_page_expect(
        &server,
        "/blogs",
        1,
        listing(vec![entry("a"), no_thumb, empty_thumb, odd_authors]),
        1,
    )
    .await;
    mount_page(&server, "/blogs", 2, listing(vec![])).await;

    let report = harvest(config.clone(), "hash", &[]).await.unwrap();
    assert_eq!(report.sources[0].failed_pages, 0);
    assert_eq!(report.sources[0].inserted, 4);

    let archive = open_archive(&config);
    assert!(archive.get_post(&link("a")).unwrap().unwrap().thumbnail.is_some());
    assert_eq!(archive.get_post(&link("no-thumb")).unwrap().unwrap().thumbnail, None);
    assert_eq!(archive.get_post(&link("empty-thumb")).unwrap().unwrap().thumbnail, None);
    assert_eq!(archive.get_post(&link("odd-authors")).unwrap().unwrap().authors, "");
}

#[tokio::test]
async fn test_null_text_is_stored_as_null() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = blogs_only(create_test_config(&server.uri(), dir.path()));

    let mut nulls = entry("nulls");
    nulls["articleName"] = Value::Null;
    nulls["timeRead"] = Value::Null;
    mount_page(&server, "/blogs", 1, listing(vec![nulls])).await;
    mount_page(&server, "/blogs", 2, listing(vec![])).await;

    harvest(config.clone(), "hash", &[]).await.unwrap();

    let stored = open_archive(&config).get_post(&link("nulls")).unwrap().unwrap();
    assert_eq!(stored.title, None);
    assert_eq!(stored.time_to_read, None);
    assert_eq!(stored.summary.as_deref(), Some("A short summary"));
}

#[tokio::test]
async fn test_failed_page_is_followed_by_page_delay() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = blogs_only(create_test_config(&server.uri(), dir.path()));
    config.crawler.max_attempts = 1;
    config.crawler.page_delay_ms = 300;

    mount_status(&server, "/blogs", 1, 500, 1).await;
    mount_page_expect(&server, "/blogs", 2, listing(vec![]), 1).await;

    let started = Instant::now();
    let report = harvest(config, "hash", &[]).await.unwrap();

    assert_eq!(report.sources[0].failed_pages, 1);
    assert_eq!(report.sources[0].stop_reason, Some(StopReason::Exhausted));
    assert!(started.elapsed() >= Duration::from_millis(300));
}
