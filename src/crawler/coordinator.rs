//! Scan coordinator - main audit orchestration logic
//!
//! This module ties the pieces of a scan together:
//! - Resolving the hostname under test and its allow rule
//! - Building the URL universe from the sitemap, explicit URLs and extras
//! - Selecting this process's batch
//! - Fetching each page and classifying its outbound links
//! - Writing reports and the optional page-cache export

use crate::allowlist::{AllowRule, AllowlistCache};
use crate::config::{load_extra_urls, ScanSettings};
use crate::crawler::batch::BatchSpec;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::extract_links;
use crate::crawler::sitemap::SitemapResolver;
use crate::output::{export_page_cache, ReportPaths, ReportWriter, UnexpectedLinks};
use crate::url::{extract_hostname, is_allowed};
use crate::{AuditError, ConfigError};
use std::path::PathBuf;

/// What to scan, as given on the command line
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Sitemap (or sitemap index) to seed the URL universe from
    pub sitemap_url: Option<String>,

    /// Move every sitemap-derived URL onto the sitemap URL's scheme and host
    pub maintain_hostname: bool,

    /// Pages to check in addition to (or instead of) the sitemap's
    pub specific_urls: Vec<String>,

    pub batch: BatchSpec,

    pub allowlist_path: PathBuf,

    /// Optional YAML file of extra paths to check on the same host
    pub additional_urls_file: Option<PathBuf>,

    /// Dump the page cache to disk once the scan completes
    pub export_cache: bool,
}

/// Result of a completed scan
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Hostname (host[:port]) under test
    pub hostname: String,

    /// Pages fetched and checked in this batch
    pub pages_checked: usize,

    pub unexpected: UnexpectedLinks,

    /// Report files, written only when something unexpected was found
    pub reports: Option<ReportPaths>,

    /// Page cache export directory, when requested
    pub cache_export: Option<PathBuf>,
}

impl ScanOutcome {
    pub fn is_clean(&self) -> bool {
        self.unexpected.is_empty()
    }
}

/// Main scan coordinator structure
pub struct Coordinator {
    settings: ScanSettings,
    fetcher: PageFetcher,
    allowlists: AllowlistCache,
}

impl Coordinator {
    /// Creates a coordinator with a fetcher built from `settings`
    pub fn new(settings: ScanSettings) -> Result<Self, AuditError> {
        let fetcher = PageFetcher::from_settings(&settings)?;
        Ok(Self::with_fetcher(settings, fetcher))
    }

    /// Creates a coordinator around an existing fetcher
    pub fn with_fetcher(settings: ScanSettings, fetcher: PageFetcher) -> Self {
        Self {
            settings,
            fetcher,
            allowlists: AllowlistCache::new(),
        }
    }

    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    /// Runs a scan to completion
    ///
    /// # Errors
    ///
    /// * `ConfigError::MissingInput` - Neither a sitemap nor a page URL was given
    /// * Configuration errors from the allowlist or extra-URLs documents
    /// * Any fatal fetch or sitemap error; no reports are written in that case
    pub async fn run(&mut self, request: &ScanRequest) -> Result<ScanOutcome, AuditError> {
        let seed = request
            .sitemap_url
            .as_deref()
            .or_else(|| request.specific_urls.first().map(String::as_str))
            .ok_or(ConfigError::MissingInput)?;

        let hostname = extract_hostname(seed)?;
        tracing::info!("Scanning {}", hostname);

        let rule = self.allowlists.load(&hostname, &request.allowlist_path)?;

        let universe = self.collect_urls(request, &hostname).await?;
        let selected = if request.batch.is_noop() {
            universe.as_slice()
        } else {
            let selected = request.batch.select(&universe);
            tracing::info!(
                "Batch {} of {}: checking {} of {} URLs",
                request.batch.index(),
                request.batch.total(),
                selected.len(),
                universe.len()
            );
            selected
        };

        let unexpected = self.check_pages(selected, &rule).await?;

        let reports = if unexpected.is_empty() {
            tracing::info!("No unexpected outbound URLs found");
            None
        } else {
            tracing::error!(
                "Unexpected outbound URLs found on {}: {}",
                hostname,
                unexpected.len()
            );
            let writer = ReportWriter::new(&self.settings.output_dir);
            Some(writer.write(&unexpected, &hostname, &request.batch.label())?)
        };

        let cache_export = if request.export_cache {
            Some(export_page_cache(
                self.fetcher.cache(),
                &self.settings.output_dir,
            )?)
        } else {
            None
        };

        Ok(ScanOutcome {
            hostname,
            pages_checked: selected.len(),
            unexpected,
            reports,
            cache_export,
        })
    }

    /// Builds the full URL universe, in order: sitemap, explicit, extras
    pub async fn collect_urls(
        &mut self,
        request: &ScanRequest,
        hostname: &str,
    ) -> Result<Vec<String>, AuditError> {
        let mut urls = Vec::new();

        if let Some(sitemap_url) = &request.sitemap_url {
            let resolver = SitemapResolver::new(request.maintain_hostname)
                .with_max_depth(self.settings.max_sitemap_depth);
            urls.extend(resolver.resolve(&mut self.fetcher, sitemap_url).await?);
        }

        urls.extend(request.specific_urls.iter().cloned());

        if let Some(path) = &request.additional_urls_file {
            let extras = load_extra_urls(path, hostname)?;
            tracing::info!("Adding {} extra URLs from {}", extras.len(), path.display());
            urls.extend(extras);
        }

        Ok(urls)
    }

    /// Fetches each page in order and records every link the rule rejects
    pub async fn check_pages(
        &mut self,
        urls: &[String],
        rule: &AllowRule,
    ) -> Result<UnexpectedLinks, AuditError> {
        let mut unexpected = UnexpectedLinks::new();

        for page_url in urls {
            let body = self.fetcher.fetch(page_url).await?;
            for link in extract_links(&body) {
                if !is_allowed(&link.url, rule) {
                    tracing::debug!("Unexpected URL {} on {}", link.url, page_url);
                    unexpected.record(&link.url, page_url);
                }
            }
        }

        Ok(unexpected)
    }
}

/// Runs a complete scan
///
/// This is the main entry point for the `scan` command.
pub async fn run_scan(
    settings: ScanSettings,
    request: &ScanRequest,
) -> Result<ScanOutcome, AuditError> {
    let mut coordinator = Coordinator::new(settings)?;
    coordinator.run(request).await
}
