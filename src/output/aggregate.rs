//! Aggregation of unexpected outbound URLs across a crawl

use std::collections::{BTreeMap, BTreeSet};

/// Unexpected URLs, each with the set of pages that reference it
///
/// Only grows during a run. Keys and referring pages are kept sorted so
/// reports come out in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnexpectedLinks {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl UnexpectedLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `referring_page` links to the unexpected `url`
    ///
    /// Returns false when the pair was already recorded.
    pub fn record(&mut self, url: &str, referring_page: &str) -> bool {
        self.entries
            .entry(url.to_string())
            .or_default()
            .insert(referring_page.to_string())
    }

    /// Current state, keyed by unexpected URL
    pub fn snapshot(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.entries
    }

    pub fn referring_pages(&self, url: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(url)
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Re-keys the aggregate by referring page
    ///
    /// # Examples
    ///
    /// ```
    /// use outlink_audit::output::UnexpectedLinks;
    ///
    /// let mut links = UnexpectedLinks::new();
    /// links.record("https://evil.example/x", "https://example.com/a");
    /// links.record("https://evil.example/y", "https://example.com/a");
    ///
    /// let by_page = links.by_referring_page();
    /// assert_eq!(by_page["https://example.com/a"].len(), 2);
    /// ```
    pub fn by_referring_page(&self) -> BTreeMap<String, Vec<String>> {
        let mut inverted: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (url, pages) in &self.entries {
            for page in pages {
                inverted.entry(page.clone()).or_default().push(url.clone());
            }
        }
        inverted
    }

    /// Number of distinct unexpected URLs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
