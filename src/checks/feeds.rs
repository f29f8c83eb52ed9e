//! RSS/Atom feed validation
//!
//! Feeds are fetched from the site under test and checked for XML
//! well-formedness. Failures are reported as `"<message> @ L:<line>"`.

use crate::config::load_feed_config;
use crate::crawler::PageFetcher;
use crate::url::scheme_for_host;
use crate::AuditError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

/// A feed that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFailure {
    pub url: String,
    pub reason: String,
}

/// Checks that `xml` is a well-formed document with a single root element
///
/// Entity references in text and attribute values must be terminated and
/// known to XML. Returns `None` for a valid feed, otherwise the reason it
/// is broken.
///
/// # Examples
///
/// ```
/// use outlink_audit::checks::check_feed;
///
/// assert_eq!(check_feed("<rss><channel></channel></rss>"), None);
/// assert!(check_feed("<rss>\n<channel>\n</rss>").unwrap().ends_with("@ L:3"));
/// assert!(check_feed("<rss><title>Tom & Jerry</title></rss>").is_some());
/// ```
pub fn check_feed(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => return Some(failure(e, xml, reader.buffer_position())),
        };

        match event {
            Event::Start(ref start) | Event::Empty(ref start) => {
                if depth == 0 && seen_root {
                    return Some(failure(
                        "junk after document element",
                        xml,
                        reader.buffer_position(),
                    ));
                }
                for attribute in start.attributes() {
                    let unescaped = attribute
                        .map_err(|e| e.to_string())
                        .and_then(|a| a.unescape_value().map(|_| ()).map_err(|e| e.to_string()));
                    if let Err(e) = unescaped {
                        return Some(failure(e, xml, reader.buffer_position()));
                    }
                }
                seen_root = true;
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(ref text) => {
                let unescaped = match text.unescape() {
                    Ok(unescaped) => unescaped,
                    Err(e) => return Some(failure(e, xml, reader.buffer_position())),
                };
                if depth == 0 && !is_blank(&unescaped) {
                    return Some(failure(
                        "text outside root element",
                        xml,
                        reader.buffer_position(),
                    ));
                }
            }
            Event::CData(_) if depth == 0 => {
                return Some(failure(
                    "text outside root element",
                    xml,
                    reader.buffer_position(),
                ))
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth > 0 {
        return Some(failure("unclosed element", xml, xml.len()));
    }
    if !seen_root {
        return Some("no element found @ L:1".to_string());
    }

    None
}

fn failure(message: impl std::fmt::Display, xml: &str, byte_position: usize) -> String {
    format!("{} @ L:{}", message, line_at(xml, byte_position))
}

// A byte order mark can survive decoding and show up as leading text
fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == '\u{feff}')
}

fn line_at(text: &str, byte_position: usize) -> usize {
    let end = byte_position.min(text.len());
    text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// Fetches and checks every feed configured for `hostname`
///
/// # Errors
///
/// * `ConfigError::Validation` - The hostname has no feed config
/// * `AuditError::Fetch` - A feed could not be fetched
pub async fn validate_feeds(
    fetcher: &mut PageFetcher,
    hostname: &str,
    config_path: &Path,
) -> Result<Vec<FeedFailure>, AuditError> {
    let config = load_feed_config(config_path, hostname)?;
    let scheme = scheme_for_host(hostname);

    let mut failures = Vec::new();
    for feed_path in &config.feed_paths {
        let feed_url = format!(
            "{}{}/{}",
            scheme,
            hostname,
            feed_path.trim_start_matches('/')
        );
        let body = fetcher.fetch(&feed_url).await?;

        if let Some(reason) = check_feed(&body) {
            tracing::warn!("Invalid feed {}: {}", feed_url, reason);
            failures.push(FeedFailure {
                url: feed_url,
                reason,
            });
        } else {
            tracing::debug!("Feed {} is valid", feed_url);
        }
    }

    Ok(failures)
}
