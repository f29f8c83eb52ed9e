//! Page cache export
//!
//! Dumps every cached page to its own file so later checks (such as the CDN
//! geo consistency check) can inspect exactly what the scan saw.

use crate::crawler::PageCache;
use crate::AuditError;
use std::path::{Path, PathBuf};

/// Subdirectory of the output directory holding exported pages
pub const PAGE_CACHE_DIR: &str = "page_cache";

/// Maps a page URL to a flat filename
///
/// URLs ending in `/` get an `.html` suffix; each `/`-separated segment is
/// percent-encoded and the segments are joined with `_`.
///
/// # Examples
///
/// ```
/// use outlink_audit::output::cache_filename;
///
/// assert_eq!(
///     cache_filename("https://www.example.com/en-US/"),
///     "https%3A__www.example.com_en-US_.html"
/// );
/// ```
pub fn cache_filename(url: &str) -> String {
    let mut name = url.to_string();
    if name.ends_with('/') {
        name.push_str(".html");
    }

    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("_")
}

/// Writes each cached page under `{output_dir}/page_cache/`
///
/// Returns the directory written to.
pub fn export_page_cache(cache: &PageCache, output_dir: &Path) -> Result<PathBuf, AuditError> {
    let target = output_dir.join(PAGE_CACHE_DIR);
    std::fs::create_dir_all(&target)?;

    for (url, body) in cache.iter() {
        let path = target.join(cache_filename(url));
        tracing::debug!("Dumping {} to {}", url, path.display());
        std::fs::write(&path, body)?;
    }

    tracing::info!("Exported {} cached pages to {}", cache.len(), target.display());
    Ok(target)
}
