//! Outlink-Audit: an outbound-link auditor for sitemap-seeded sites
//!
//! This crate walks a site's sitemap (or a fixed list of pages), extracts the
//! outbound links on each page and classifies them against a per-hostname
//! allowlist. Links matching neither an allowed literal nor an allowed regex
//! are aggregated and written out as reports for a downstream remediation step.

pub mod allowlist;
pub mod checks;
pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Outlink-Audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch {url} after {attempts} attempt(s): {source}")]
    Fetch {
        url: String,
        attempts: u32,
        source: reqwest::Error,
    },

    #[error("Malformed sitemap at {url}: {message}")]
    Sitemap { url: String, message: String },

    #[error("Sitemap {url} is nested deeper than the maximum depth of {max_depth}")]
    SitemapDepth { url: String, max_depth: usize },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid allowlist regex '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("--batch parameter {0} was nonsensical")]
    InvalidBatch(String),

    #[error("No sitemap or input URLs specified. Cannot proceed.")]
    MissingInput,
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Outlink-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::allowlist::{AllowRule, AllowlistCache};
pub use crate::config::ScanSettings;
pub use crate::crawler::{BatchSpec, PageFetcher, ScanOutcome, ScanRequest};
pub use crate::output::{ReportPaths, ReportWriter, UnexpectedLinks};
pub use crate::url::is_allowed;
