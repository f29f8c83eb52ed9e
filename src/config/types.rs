use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Allowlist document, as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct AllowlistDocument {
    /// Hostnames (host or host:port) this allowlist applies to
    pub relevant_hostnames: Vec<String>,

    /// Exact outbound URLs that are always acceptable
    #[serde(default)]
    pub allowed_outbound_url_literals: Vec<String>,

    /// Regex sources, matched from the start of the URL
    #[serde(default)]
    pub allowed_outbound_url_regexes: Vec<String>,
}

/// Extra paths to check that the sitemap deliberately omits
#[derive(Debug, Clone, Deserialize)]
pub struct ExtraUrlsDocument {
    #[serde(default)]
    pub extra_urls_to_check: Vec<String>,
}

/// Feed validation config
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfigDocument {
    pub relevant_hostnames: Vec<String>,

    /// Paths of RSS/Atom feeds, relative to the site root
    #[serde(default)]
    pub feed_paths: Vec<String>,
}

/// Fetch retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a fetch makes at most `limit + 1` requests
    pub limit: u32,

    /// Fixed delay between attempts
    pub wait: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_LIMIT: u32 = 3;
    pub const DEFAULT_WAIT: Duration = Duration::from_secs(4);

    pub fn new(limit: u32, wait: Duration) -> Self {
        Self { limit, wait }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            wait: Self::DEFAULT_WAIT,
        }
    }
}

/// Runtime settings for a scan
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Optional User-Agent header sent with every request
    pub user_agent: Option<String>,

    pub retry: RetryPolicy,

    /// Locale path segments (e.g. "en-US") whose pages are kept in the page cache
    pub cacheable_locales: Vec<String>,

    /// Directory reports and cache dumps are written to
    pub output_dir: PathBuf,

    /// Optional bound on sitemap nesting; `None` follows the document wherever it goes
    pub max_sitemap_depth: Option<usize>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            user_agent: None,
            retry: RetryPolicy::default(),
            cacheable_locales: vec!["en-US".to_string()],
            output_dir: PathBuf::from("output"),
            max_sitemap_depth: None,
        }
    }
}
