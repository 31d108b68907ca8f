//! Raw entry normalization
//!
//! Turns one `RawEntry` into a `Post`. Nothing here fails: malformed input
//! degrades to a placeholder or an absent value so that a single odd entry
//! never costs the rest of the page.

use crate::record::{Post, RawEntry, AUTHOR_SEPARATOR, MISSING_TEXT};
use chrono::NaiveDate;
use serde_json::Value;
use unicode_general_category::{get_general_category, GeneralCategory};

/// Date format used by listing pages, e.g. `Jan 05, 2024`
const LISTING_DATE_FORMAT: &str = "%b %d, %Y";

/// Date format stored in the archive
const ARCHIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalizes one raw listing entry into a canonical post
///
/// # Arguments
///
/// * `entry` - The decoded listing entry
/// * `base_url` - Site origin prepended to the entry's relative path
///
/// # Example
///
/// ```
/// use post_harvest::record::{normalize_entry, RawEntry};
///
/// let entry = RawEntry {
///     article_url: Some("/blogs/a-post".to_string()),
///     ..Default::default()
/// };
/// let post = normalize_entry(&entry, "https://www.gamedeveloper.com");
/// assert_eq!(post.link, "https://www.gamedeveloper.com/blogs/a-post");
/// assert_eq!(post.title.as_deref(), Some("N/A"));
/// ```
pub fn normalize_entry(entry: &RawEntry, base_url: &str) -> Post {
    let link = format!("{}{}", base_url, entry.article_url.as_deref().unwrap_or(""));

    let authors = entry
        .contributors
        .iter()
        .filter_map(|c| c.name.as_ref())
        .map(value_text)
        .collect::<Vec<_>>()
        .join(AUTHOR_SEPARATOR);

    let date = entry
        .date
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_listing_date);

    let thumbnail = entry
        .thumbnail_src()
        .filter(|src| !src.is_empty())
        .map(str::to_string);

    Post {
        link,
        title: optional_text(entry.article_name.as_ref()),
        authors,
        date,
        summary: optional_text(entry.article_summary.as_ref()),
        thumbnail,
        time_to_read: passthrough_text(entry.time_read.as_ref()),
        category_name: optional_text(entry.category_name.as_ref()),
    }
}

/// Removes every non-printable character from a string
pub fn clean_text(text: &str) -> String {
    text.chars().filter(|c| is_printable(*c)).collect()
}

/// Returns true if the character is printable
///
/// Printable means any general category except Other (control, format,
/// surrogate, private use, unassigned) and Separator. The ASCII space is the
/// one separator kept.
pub fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
            | GeneralCategory::SpaceSeparator
    )
}

/// Parses a listing date such as `Jan 05, 2024`
///
/// Returns `None` for anything that does not match the format exactly.
pub fn parse_listing_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, LISTING_DATE_FORMAT).ok()
}

/// Formats a date the way the archive stores it
pub fn format_date(date: NaiveDate) -> String {
    date.format(ARCHIVE_DATE_FORMAT).to_string()
}

/// Cleaned text of a field; placeholder when missing, absent when `null`
fn optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        None => Some(MISSING_TEXT.to_string()),
        Some(Value::Null) => None,
        Some(v) => Some(value_text(v)),
    }
}

/// Cleans strings; other JSON values keep their literal rendering
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => clean_text(s),
        other => other.to_string(),
    }
}

/// Uncleaned text, for fields passed through as-is
fn passthrough_text(value: Option<&Value>) -> Option<String> {
    match value {
        None => Some(MISSING_TEXT.to_string()),
        Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}
