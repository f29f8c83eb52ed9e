//! HTML link extraction
//!
//! This module pulls candidate outbound URLs out of a fetched page:
//! - `<a href>`
//! - `<script src>`
//! - `<link src>` and `<link href>` (the latter covers RSS/Atom feed links)
//!
//! Values are returned exactly as written in the markup; relative and
//! absolute forms are both left for the allowlist to judge.

use scraper::{Html, Selector};

/// Where in the markup a candidate URL was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkSource {
    AnchorHref,
    ScriptSrc,
    LinkSrc,
    LinkHref,
}

impl LinkSource {
    /// Extraction order
    pub const ALL: [LinkSource; 4] = [
        LinkSource::AnchorHref,
        LinkSource::ScriptSrc,
        LinkSource::LinkSrc,
        LinkSource::LinkHref,
    ];

    fn selector(&self) -> &'static str {
        match self {
            Self::AnchorHref => "a[href]",
            Self::ScriptSrc => "script[src]",
            Self::LinkSrc => "link[src]",
            Self::LinkHref => "link[href]",
        }
    }

    /// The attribute holding the URL
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::AnchorHref | Self::LinkHref => "href",
            Self::ScriptSrc | Self::LinkSrc => "src",
        }
    }
}

/// A candidate outbound URL and the element attribute it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub url: String,
    pub source: LinkSource,
}

/// Extracts candidate URLs from an HTML document
///
/// Elements are visited per source in [`LinkSource::ALL`] order, then in
/// document order. Empty attribute values are skipped; nothing else is
/// filtered or normalized.
///
/// # Example
///
/// ```
/// use outlink_audit::crawler::{extract_links, LinkSource};
///
/// let html = r#"<html><body><a href="/about/">About</a><script src="https://cdn.example.com/app.js"></script></body></html>"#;
/// let links = extract_links(html);
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[0].url, "/about/");
/// assert_eq!(links[1].source, LinkSource::ScriptSrc);
/// ```
pub fn extract_links(html: &str) -> Vec<ExtractedLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for source in LinkSource::ALL {
        let Ok(selector) = Selector::parse(source.selector()) else {
            continue;
        };

        for element in document.select(&selector) {
            if let Some(url) = element.value().attr(source.attribute()) {
                if !url.is_empty() {
                    links.push(ExtractedLink {
                        url: url.to_string(),
                        source,
                    });
                }
            }
        }
    }

    links
}
