//! Wire types for one listing page
//!
//! Only the fields the harvester consumes are modelled. Everything else in the
//! upstream payload is ignored by serde.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Top-level listing response: `{"template": {"contents": [...]}}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub template: ListingTemplate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingTemplate {
    /// Entries on this page, newest first; empty once the feed is exhausted
    #[serde(default)]
    pub contents: Vec<RawEntry>,
}

impl ListingPage {
    /// Consumes the page and returns its entries
    pub fn into_entries(self) -> Vec<RawEntry> {
        self.template.contents
    }
}

/// One raw entry as delivered by the listing API
///
/// Text fields are kept as loose JSON values because upstream occasionally
/// sends numbers or nulls where strings are expected. A present `null` is kept
/// as `Some(Value::Null)` so it stays distinguishable from a missing key.
/// Structured fields of the wrong shape decode as absent instead of failing
/// the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    /// Path relative to the site origin, e.g. `/blogs/some-post`
    #[serde(default, deserialize_with = "lenient")]
    pub article_url: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub article_name: Option<Value>,

    #[serde(default, deserialize_with = "lenient")]
    pub contributors: Vec<RawContributor>,

    /// Display date, e.g. `Jan 05, 2024`
    #[serde(default)]
    pub date: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub article_summary: Option<Value>,

    /// Usually `{"src": ...}`; anything else means no thumbnail
    #[serde(default)]
    pub thumbnail: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub time_read: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub category_name: Option<Value>,
}

impl RawEntry {
    /// Thumbnail URL, if the entry carries a thumbnail object with a string `src`
    pub fn thumbnail_src(&self) -> Option<&str> {
        self.thumbnail
            .as_ref()
            .and_then(|t| t.get("src"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContributor {
    #[serde(default)]
    pub name: Option<Value>,
}

/// Keeps an explicit `null` as `Some(Value::Null)`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Decodes into `T`, falling back to `T::default()` on a shape mismatch
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
