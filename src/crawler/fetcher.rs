//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the auditor, including:
//! - Building HTTP clients with an optional custom user agent
//! - Retry with a fixed backoff on transient failures
//! - The run-scoped page cache

use crate::config::{RetryPolicy, ScanSettings};
use crate::AuditError;
use reqwest::Client;
use std::collections::HashMap;

/// Bodies of pages fetched during this run, keyed by exact URL string
///
/// Entries are never replaced or evicted; the cache lives as long as the
/// fetcher that owns it.
#[derive(Debug, Clone, Default)]
pub struct PageCache {
    pages: HashMap<String, String>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.pages.get(url).map(String::as_str)
    }

    /// Stores a page body; an existing entry for the URL is kept
    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.pages.entry(url.into()).or_insert_with(|| body.into());
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pages.iter().map(|(url, body)| (url.as_str(), body.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Builds an HTTP client
///
/// # Arguments
///
/// * `user_agent` - Optional User-Agent header value; reqwest's default is sent otherwise
///
/// # Example
///
/// ```no_run
/// use outlink_audit::crawler::build_http_client;
///
/// let client = build_http_client(Some("outlink-audit/1.0")).unwrap();
/// ```
pub fn build_http_client(user_agent: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().gzip(true).brotli(true);

    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent);
    }

    builder.build()
}

/// Returns true for failures worth another attempt
///
/// | Condition | Retried |
/// |-----------|---------|
/// | Connection refused / reset | yes |
/// | Timeout | yes |
/// | HTTP 4xx / 5xx status | yes |
/// | Truncated or undecodable body (e.g. broken chunked encoding) | yes |
/// | Malformed URL, unsupported scheme | no |
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect()
        || error.is_timeout()
        || error.is_status()
        || error.is_body()
        || error.is_decode()
        || error.is_request()
}

/// Fetches pages with retry, memoizing pages under cacheable locales
pub struct PageFetcher {
    client: Client,
    retry: RetryPolicy,
    cacheable_locales: Vec<String>,
    cache: PageCache,
}

impl PageFetcher {
    /// Creates a fetcher with an empty cache
    pub fn new(client: Client, retry: RetryPolicy, cacheable_locales: Vec<String>) -> Self {
        Self::with_cache(client, retry, cacheable_locales, PageCache::new())
    }

    /// Creates a fetcher around an existing (possibly pre-seeded) cache
    pub fn with_cache(
        client: Client,
        retry: RetryPolicy,
        cacheable_locales: Vec<String>,
        cache: PageCache,
    ) -> Self {
        Self {
            client,
            retry,
            cacheable_locales,
            cache,
        }
    }

    /// Builds a fetcher from scan settings
    pub fn from_settings(settings: &ScanSettings) -> Result<Self, AuditError> {
        let client = build_http_client(settings.user_agent.as_deref())?;
        Ok(Self::new(
            client,
            settings.retry,
            settings.cacheable_locales.clone(),
        ))
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Whether a successful fetch of `url` is kept in the cache
    ///
    /// Only pages under one of the configured locale path segments
    /// (e.g. `/en-US/`) are cached.
    pub fn is_cacheable(&self, url: &str) -> bool {
        self.cacheable_locales
            .iter()
            .any(|locale| url.contains(&format!("/{}/", locale)))
    }

    /// Fetches a URL's body, serving it from the cache when possible
    ///
    /// Transient failures are retried up to the policy limit with a fixed
    /// wait in between, so a failing URL is requested at most `limit + 1`
    /// times. The last error is returned once retries are exhausted.
    pub async fn fetch(&mut self, url: &str) -> Result<String, AuditError> {
        if let Some(body) = self.cache.get(url) {
            tracing::info!("Getting {} from cache", url);
            return Ok(body.to_string());
        }

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            tracing::info!("Pulling down {}", url);

            match self.fetch_once(url).await {
                Ok(body) => {
                    if self.is_cacheable(url) {
                        self.cache.insert(url, body.as_str());
                    }
                    return Ok(body);
                }
                Err(e) if is_transient(&e) && attempts <= self.retry.limit => {
                    tracing::warn!(
                        "Waiting {:?} before retrying {}, following {}",
                        self.retry.wait,
                        url,
                        e
                    );
                    tokio::time::sleep(self.retry.wait).await;
                }
                Err(e) => {
                    if is_transient(&e) {
                        tracing::error!("Max retries ({}) reached for {}: {}", self.retry.limit, url, e);
                    }
                    return Err(AuditError::Fetch {
                        url: url.to_string(),
                        attempts,
                        source: e,
                    });
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}
