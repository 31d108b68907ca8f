//! Output module for run reports and archive summaries
//!
//! This module handles:
//! - The end-of-run report logged after every harvest
//! - The last-run information file
//! - Archive statistics for the `--stats` mode

mod report;
mod scrape_info;
pub mod stats;

pub use report::HarvestReport;
pub use scrape_info::{format_scrape_info, write_scrape_info};
pub use stats::{load_statistics, print_statistics, ArchiveStatistics};
