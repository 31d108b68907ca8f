//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `CrawlState`: per-source page counter and streaks, advanced by `decide`
//! - `NoveltyOutcome`: what the store did with one post
//! - `PageOutcome`: what happened to one page, as seen by the controller

mod crawl_state;
mod outcome;

// Re-export main types
pub use crawl_state::{decide, CrawlPhase, CrawlState, StopReason, TerminationPolicy};
pub use outcome::{NoveltyOutcome, PageOutcome, PageTally};
