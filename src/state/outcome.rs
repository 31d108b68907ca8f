//! Per-post and per-page outcomes fed into the crawl controller

use std::fmt;

/// Result of merging one post into the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoveltyOutcome {
    /// The link was unseen; the full row was written
    Inserted,

    /// The link existed and its featured flag was raised
    Merged,

    /// The link existed and nothing changed
    Skipped,
}

impl NoveltyOutcome {
    /// Only insertions count as new data for termination
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Inserted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Merged => "merged",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for NoveltyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post counts for one fetched page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTally {
    pub inserted: u32,
    pub merged: u32,
    pub skipped: u32,
}

impl PageTally {
    /// Adds one post outcome to the tally
    pub fn record(&mut self, outcome: NoveltyOutcome) {
        match outcome {
            NoveltyOutcome::Inserted => self.inserted += 1,
            NoveltyOutcome::Merged => self.merged += 1,
            NoveltyOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.inserted + self.merged + self.skipped
    }
}

/// What happened to one page, as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was fetched and carried no entries
    Empty,

    /// The page was fetched and every entry went through the store
    Fetched(PageTally),

    /// Every fetch attempt failed
    Failed,
}

impl PageOutcome {
    /// Builds the outcome for a fetched page from its per-post results
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = NoveltyOutcome>,
    {
        let mut tally = PageTally::default();
        for outcome in outcomes {
            tally.record(outcome);
        }
        if tally.total() == 0 {
            Self::Empty
        } else {
            Self::Fetched(tally)
        }
    }

    /// True if at least one post on the page was newly inserted
    pub fn has_new_data(&self) -> bool {
        matches!(self, Self::Fetched(tally) if tally.inserted > 0)
    }
}
