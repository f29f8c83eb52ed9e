//! Crawler module for page fetching and scan orchestration
//!
//! This module contains the core scanning logic, including:
//! - HTTP fetching with retry and the run-scoped page cache
//! - Sitemap resolution
//! - Batch partitioning of the URL universe
//! - HTML link extraction
//! - Overall scan coordination

mod batch;
mod coordinator;
mod fetcher;
mod parser;
mod sitemap;

pub use batch::BatchSpec;
pub use coordinator::{run_scan, Coordinator, ScanOutcome, ScanRequest};
pub use fetcher::{build_http_client, PageCache, PageFetcher};
pub use parser::{extract_links, ExtractedLink, LinkSource};
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapNode, SitemapResolver};
