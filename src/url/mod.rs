//! URL handling module for Outlink-Audit
//!
//! This module provides allowlist classification of extracted URLs, hostname
//! extraction, sitemap hostname rewriting, and the URL-shape check used when
//! triaging reported findings.

mod domain;
mod matcher;
mod rewrite;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

// Re-export main functions
pub use domain::{extract_hostname, scheme_for_host, split_origin};
pub use matcher::is_allowed;
pub use rewrite::rewrite_origin;

/// Relative URLs worth proposing for the allowlist: a path segment
/// followed by further non-empty path content
const RELATIVE_URL_PATTERN: &str = r"^[^/]+/[^/].*$|^/[^/].*$";

/// Schemes accepted for absolute URL findings
const ABSOLUTE_URL_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];

static RELATIVE_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(RELATIVE_URL_PATTERN).unwrap_or_else(|e| panic!("invalid built-in regex: {}", e))
});

/// Checks whether a reported finding looks like a real URL
///
/// Accepts absolute URLs with a host on a web scheme, and root-relative
/// paths such as `/en-US/about/`. Anything else (protocol-relative
/// `//host` strings, stray markup, template placeholders) is treated as
/// malformed content rather than a link.
///
/// # Examples
///
/// ```
/// use outlink_audit::url::is_plausible_url;
///
/// assert!(is_plausible_url("https://partner.example.org/page"));
/// assert!(is_plausible_url("/en-US/about/"));
/// assert!(!is_plausible_url("//evil.example/x"));
/// assert!(!is_plausible_url("{{ url('home') }}"));
/// ```
pub fn is_plausible_url(candidate: &str) -> bool {
    if let Ok(parsed) = Url::parse(candidate) {
        if ABSOLUTE_URL_SCHEMES.contains(&parsed.scheme()) && parsed.host_str().is_some() {
            return true;
        }
    }

    candidate.starts_with('/') && RELATIVE_URL_REGEX.is_match(candidate)
}
