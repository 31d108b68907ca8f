/// Per-source crawl state and the termination decision
///
/// The controller is split in two: `decide` is a pure function from the
/// current state and the last page's outcome to the next state, and the
/// harvest coordinator performs the I/O around it.
use crate::config::{CrawlerConfig, FailedPagePolicy};
use crate::state::PageOutcome;
use std::fmt;

/// Why a source stopped being crawled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// A page came back with no entries at all
    Exhausted,

    /// Too many consecutive pages without a newly inserted post
    DuplicateStreak,

    /// Too many consecutive abandoned pages (only under `FailedPagePolicy::Ignore`)
    FailureStreak,

    /// The configured page bound was reached
    PageLimit,
}

impl StopReason {
    /// Converts the reason to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::DuplicateStreak => "duplicate_streak",
            Self::FailureStreak => "failure_streak",
            Self::PageLimit => "page_limit",
        }
    }

    /// Parses a reason from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "exhausted" => Some(Self::Exhausted),
            "duplicate_streak" => Some(Self::DuplicateStreak),
            "failure_streak" => Some(Self::FailureStreak),
            "page_limit" => Some(Self::PageLimit),
            _ => None,
        }
    }

    /// Returns a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Exhausted => "no more posts",
            Self::DuplicateStreak => "consecutive pages with duplicates only",
            Self::FailureStreak => "consecutive pages that could not be fetched",
            Self::PageLimit => "page limit reached",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Lifecycle of one source's crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Advancing,
    Stopped(StopReason),
}

/// Thresholds that end a source's crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    pub duplicate_threshold: u32,
    pub failed_pages: FailedPagePolicy,
    pub max_consecutive_failures: u32,
    pub max_pages: Option<u32>,
}

impl TerminationPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            duplicate_threshold: config.duplicate_page_threshold,
            failed_pages: config.failed_page_policy,
            max_consecutive_failures: config.max_consecutive_failures,
            max_pages: config.max_pages,
        }
    }
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self {
            duplicate_threshold: 3,
            failed_pages: FailedPagePolicy::CountAsDuplicate,
            max_consecutive_failures: 5,
            max_pages: None,
        }
    }
}

/// Crawl state for one source
///
/// Created when a source starts and dropped when it stops. While advancing,
/// `page` is the next page to fetch; once stopped it is the last page
/// processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlState {
    pub page: u32,
    pub duplicate_streak: u32,
    pub failure_streak: u32,
    pub phase: CrawlPhase,
}

impl CrawlState {
    /// State at the start of a source: page 1, no streaks
    pub fn new() -> Self {
        Self {
            page: 1,
            duplicate_streak: 0,
            failure_streak: 0,
            phase: CrawlPhase::Advancing,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.phase, CrawlPhase::Stopped(_))
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.phase {
            CrawlPhase::Stopped(reason) => Some(reason),
            CrawlPhase::Advancing => None,
        }
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the state that follows processing `state.page` with `outcome`
///
/// An empty page stops the source immediately. Otherwise the streak
/// thresholds are checked first and the page bound last. A stopped state is
/// returned unchanged.
pub fn decide(state: CrawlState, outcome: PageOutcome, policy: &TerminationPolicy) -> CrawlState {
    if state.is_stopped() {
        return state;
    }

    let mut next = state;

    match outcome {
        PageOutcome::Empty => {
            next.phase = CrawlPhase::Stopped(StopReason::Exhausted);
            return next;
        }
        PageOutcome::Fetched(tally) => {
            next.failure_streak = 0;
            if tally.inserted > 0 {
                next.duplicate_streak = 0;
            } else {
                next.duplicate_streak += 1;
            }
        }
        PageOutcome::Failed => {
            next.failure_streak += 1;
            if policy.failed_pages == FailedPagePolicy::CountAsDuplicate {
                next.duplicate_streak += 1;
            }
        }
    }

    if next.duplicate_streak >= policy.duplicate_threshold {
        next.phase = CrawlPhase::Stopped(StopReason::DuplicateStreak);
    } else if policy.failed_pages == FailedPagePolicy::Ignore
        && next.failure_streak >= policy.max_consecutive_failures
    {
        next.phase = CrawlPhase::Stopped(StopReason::FailureStreak);
    } else if policy.max_pages.is_some_and(|max| state.page >= max) {
        next.phase = CrawlPhase::Stopped(StopReason::PageLimit);
    } else {
        next.page += 1;
    }

    next
}
