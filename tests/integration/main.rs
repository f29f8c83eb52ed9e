//! Integration tests for outlink-audit
//!
//! These tests use wiremock to stand up mock sites and tempfile for
//! allowlists and output directories.

mod checks_tests;
mod scan_tests;

use outlink_audit::config::{RetryPolicy, ScanSettings};
use outlink_audit::crawler::{build_http_client, PageFetcher};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings with no retry wait, writing into `output_dir`
pub fn test_settings(output_dir: &Path, retry_limit: u32) -> ScanSettings {
    ScanSettings {
        retry: RetryPolicy::new(retry_limit, Duration::ZERO),
        output_dir: output_dir.to_path_buf(),
        ..ScanSettings::default()
    }
}

/// A fetcher matching `settings`
pub fn test_fetcher(settings: &ScanSettings) -> PageFetcher {
    PageFetcher::new(
        build_http_client(Some("outlink-audit-tests")).expect("Failed to build client"),
        settings.retry,
        settings.cacheable_locales.clone(),
    )
}

/// Host and port of a mock server, e.g. "127.0.0.1:41234"
pub fn hostname_of(base_url: &str) -> String {
    base_url
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

/// Writes a YAML document into `dir` and returns its path
pub fn write_yaml(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write YAML");
    path
}
