//! The ordered set of listing sources
//!
//! Sources are harvested strictly one after another in configured order, so a
//! later source always sees the rows written by earlier ones. With the usual
//! setup (full listing first, featured listing second) the featured pass mostly
//! raises flags on posts the first pass just inserted.

use crate::config::{SourceEntry, PAGE_PLACEHOLDER};
use crate::ConfigError;

/// One listing feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSource {
    pub name: String,
    pub url_template: String,
    pub featured: bool,
}

impl ListingSource {
    /// URL of the given page of this source
    pub fn page_url(&self, page: u32) -> String {
        self.url_template.replace(PAGE_PLACEHOLDER, &page.to_string())
    }
}

impl From<&SourceEntry> for ListingSource {
    fn from(entry: &SourceEntry) -> Self {
        Self {
            name: entry.name.clone(),
            url_template: entry.url_template.clone(),
            featured: entry.featured,
        }
    }
}

/// Ordered list of sources for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    sources: Vec<ListingSource>,
}

impl SourceSet {
    pub fn new(sources: Vec<ListingSource>) -> Self {
        Self { sources }
    }

    /// Builds the set from configured entries, keeping their order
    pub fn from_config(entries: &[SourceEntry]) -> Self {
        Self::new(entries.iter().map(ListingSource::from).collect())
    }

    /// Restricts the set to the named sources, keeping configured order
    ///
    /// An empty `names` slice keeps every source. Unknown names are an error.
    pub fn only(self, names: &[String]) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Ok(self);
        }

        if let Some(unknown) = names
            .iter()
            .find(|name| !self.sources.iter().any(|s| &s.name == *name))
        {
            return Err(ConfigError::Validation(format!(
                "unknown source '{}'",
                unknown
            )));
        }

        let sources = self
            .sources
            .into_iter()
            .filter(|s| names.contains(&s.name))
            .collect();
        Ok(Self { sources })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ListingSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<'a> IntoIterator for &'a SourceSet {
    type Item = &'a ListingSource;
    type IntoIter = std::slice::Iter<'a, ListingSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}
