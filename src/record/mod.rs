//! Canonical post records
//!
//! This module covers everything between a decoded listing page and a row in
//! the archive:
//! - Wire types for listing pages (`listing`)
//! - Cleaning and reshaping raw entries into `Post` values (`normalize`)

mod listing;
mod normalize;

pub use listing::{ListingPage, ListingTemplate, RawContributor, RawEntry};
pub use normalize::{clean_text, format_date, is_printable, normalize_entry, parse_listing_date};

use chrono::NaiveDate;

/// Placeholder stored for text fields missing from the upstream entry
///
/// A field that is present but `null` is stored as NULL instead.
pub const MISSING_TEXT: &str = "N/A";

/// Separator used when joining contributor names
pub const AUTHOR_SEPARATOR: &str = ", ";

/// A normalized post, ready to be merged into the archive
///
/// The featured flag is not part of the record; it is decided by the source the
/// post was observed in and applied by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Absolute link; unique key of the archive
    pub link: String,
    /// `None` when upstream sent `null`
    pub title: Option<String>,
    /// Contributor names joined with `", "`
    pub authors: String,
    /// Publication date, absent when the listing date could not be parsed
    pub date: Option<NaiveDate>,
    pub summary: Option<String>,
    pub thumbnail: Option<String>,
    /// Reading time exactly as the listing reported it
    pub time_to_read: Option<String>,
    pub category_name: Option<String>,
}

impl Post {
    /// Returns the date in archive format (`YYYY-MM-DD`)
    pub fn date_string(&self) -> Option<String> {
        self.date.map(format_date)
    }
}

/// A post as stored, including its featured flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub link: String,
    pub title: Option<String>,
    pub authors: String,
    /// Stored date text (`YYYY-MM-DD`) or `None`
    pub date: Option<String>,
    pub summary: Option<String>,
    pub thumbnail: Option<String>,
    pub time_to_read: Option<String>,
    pub category_name: Option<String>,
    pub featured: bool,
}
