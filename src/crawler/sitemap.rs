//! Sitemap parsing and recursive resolution
//!
//! A sitemap document may hold `<sitemap><loc>` index entries pointing at
//! further sitemaps, `<url><loc>` leaf entries naming pages, or both.
//! Resolution follows index entries depth-first and returns every page URL
//! found, in document order.

use crate::crawler::fetcher::PageFetcher;
use crate::url::{rewrite_origin, split_origin};
use crate::{AuditError, UrlError};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::future::Future;
use std::pin::Pin;

/// One entry of a sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapNode {
    /// A pointer to a child sitemap
    Index { loc: String },

    /// A page URL
    Leaf { loc: String, lastmod: Option<String> },
}

/// Parsed contents of a single sitemap document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    pub nodes: Vec<SitemapNode>,

    /// Entries skipped because they had no usable `<loc>`
    pub missing_locations: usize,
}

impl SitemapDocument {
    pub fn child_sitemaps(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match node {
            SitemapNode::Index { loc } => Some(loc.as_str()),
            SitemapNode::Leaf { .. } => None,
        })
    }

    pub fn page_urls(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match node {
            SitemapNode::Leaf { loc, .. } => Some(loc.as_str()),
            SitemapNode::Index { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Index,
    Leaf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Loc,
    Lastmod,
}

/// An entry being read; `depth` is the nesting level of its opening tag
struct PendingEntry {
    kind: EntryKind,
    depth: usize,
    loc: String,
    lastmod: String,
}

impl PendingEntry {
    fn new(kind: EntryKind, depth: usize) -> Self {
        Self {
            kind,
            depth,
            loc: String::new(),
            lastmod: String::new(),
        }
    }

    fn push_text(&mut self, field: Field, text: &str) {
        match field {
            Field::Loc => self.loc.push_str(text),
            Field::Lastmod => self.lastmod.push_str(text),
        }
    }

    fn finish(self) -> Option<SitemapNode> {
        let loc = self.loc.trim().to_string();
        if loc.is_empty() {
            return None;
        }

        Some(match self.kind {
            EntryKind::Index => SitemapNode::Index { loc },
            EntryKind::Leaf => {
                let lastmod = self.lastmod.trim();
                SitemapNode::Leaf {
                    loc,
                    lastmod: (!lastmod.is_empty()).then(|| lastmod.to_string()),
                }
            }
        })
    }
}

/// Parses a sitemap or sitemap index document
///
/// Only `<loc>`/`<lastmod>` elements that are direct children of an entry
/// are read, so extension elements such as `<image:loc>` are ignored.
/// Entries without a `<loc>` are counted rather than failing the parse.
///
/// # Errors
///
/// Returns a description of the problem when the document is not well-formed XML.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut document = SitemapDocument::default();
    let mut pending: Option<PendingEntry> = None;
    let mut field: Option<Field> = None;
    let mut depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                depth += 1;
                match element.local_name().as_ref() {
                    b"sitemap" if pending.is_none() => {
                        pending = Some(PendingEntry::new(EntryKind::Index, depth));
                    }
                    b"url" if pending.is_none() => {
                        pending = Some(PendingEntry::new(EntryKind::Leaf, depth));
                    }
                    name @ (b"loc" | b"lastmod") => {
                        if let Some(entry) = &pending {
                            if depth == entry.depth + 1 {
                                field = Some(if name == b"loc" {
                                    Field::Loc
                                } else {
                                    Field::Lastmod
                                });
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(element)) => {
                let name = element.local_name();
                if pending.is_none() && matches!(name.as_ref(), b"sitemap" | b"url") {
                    document.missing_locations += 1;
                }
            }
            Ok(Event::Text(text)) => {
                if let (Some(entry), Some(field)) = (pending.as_mut(), field) {
                    let text = text
                        .unescape()
                        .map_err(|e| format!("{} at byte {}", e, reader.buffer_position()))?;
                    entry.push_text(field, &text);
                }
            }
            Ok(Event::CData(data)) => {
                if let (Some(entry), Some(field)) = (pending.as_mut(), field) {
                    entry.push_text(field, &String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                field = None;
                if pending.as_ref().is_some_and(|entry| entry.depth == depth) {
                    if let Some(entry) = pending.take() {
                        match entry.finish() {
                            Some(node) => document.nodes.push(node),
                            None => document.missing_locations += 1,
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("{} at byte {}", e, reader.buffer_position())),
            _ => {}
        }
    }

    Ok(document)
}

type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>, AuditError>> + 'a>>;

/// Expands a sitemap URL into the page URLs it (transitively) lists
#[derive(Debug, Clone, Copy, Default)]
pub struct SitemapResolver {
    maintain_hostname: bool,
    max_depth: Option<usize>,
}

impl SitemapResolver {
    /// Creates a resolver
    ///
    /// With `maintain_hostname`, every URL found (child sitemaps included) is
    /// moved onto the scheme and host of the top-level sitemap URL.
    pub fn new(maintain_hostname: bool) -> Self {
        Self {
            maintain_hostname,
            max_depth: None,
        }
    }

    /// Bounds how many levels of index entries are followed
    ///
    /// `None` follows the documents wherever they lead, including around a
    /// sitemap that lists itself.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolves `sitemap_url` into page URLs
    ///
    /// Child sitemaps are resolved in index order before the document's own
    /// leaves. No deduplication is done.
    ///
    /// # Errors
    ///
    /// * `AuditError::Fetch` - A sitemap could not be fetched after retries
    /// * `AuditError::Sitemap` - A sitemap was not well-formed XML
    /// * `AuditError::SitemapDepth` - Nesting exceeded the configured bound
    pub async fn resolve(
        &self,
        fetcher: &mut PageFetcher,
        sitemap_url: &str,
    ) -> Result<Vec<String>, AuditError> {
        let origin = if self.maintain_hostname {
            let (origin, _) = split_origin(sitemap_url)
                .ok_or_else(|| UrlError::MissingHost(sitemap_url.to_string()))?;
            Some(origin.to_string())
        } else {
            None
        };

        let urls = self
            .resolve_at(fetcher, sitemap_url.to_string(), origin.as_deref(), 0)
            .await?;
        tracing::info!("Discovered {} URLs in {}", urls.len(), sitemap_url);
        Ok(urls)
    }

    fn resolve_at<'a>(
        &'a self,
        fetcher: &'a mut PageFetcher,
        sitemap_url: String,
        origin: Option<&'a str>,
        depth: usize,
    ) -> ResolveFuture<'a> {
        Box::pin(async move {
            if let Some(max_depth) = self.max_depth {
                if depth > max_depth {
                    return Err(AuditError::SitemapDepth {
                        url: sitemap_url,
                        max_depth,
                    });
                }
            }

            let xml = fetcher.fetch(&sitemap_url).await?;
            let document = parse_sitemap(&xml).map_err(|message| AuditError::Sitemap {
                url: sitemap_url.clone(),
                message,
            })?;

            let mut urls = Vec::new();

            let children: Vec<String> = document.child_sitemaps().map(String::from).collect();
            if !children.is_empty() {
                tracing::info!("Discovered {} child sitemaps", children.len());
            }

            for child in children {
                let child = match origin {
                    Some(origin) => rewrite_origin(origin, vec![child.clone()])
                        .into_iter()
                        .next()
                        .unwrap_or(child),
                    None => child,
                };

                tracing::info!("Diving into {}", child);
                let child_urls = self.resolve_at(fetcher, child, origin, depth + 1).await?;
                urls.extend(child_urls);
            }

            let leaves: Vec<String> = document.page_urls().map(String::from).collect();
            if !leaves.is_empty() {
                tracing::info!("Adding {} URLs", leaves.len());
            }
            // Child URLs were already moved onto the origin at their own level
            urls.extend(match origin {
                Some(origin) => rewrite_origin(origin, leaves),
                None => leaves,
            });

            if document.missing_locations > 0 {
                tracing::warn!(
                    "{} entries in {} are missing '<loc>', skipping them",
                    document.missing_locations,
                    sitemap_url
                );
            }

            Ok(urls)
        })
    }
}
