//! Output module for scan findings
//!
//! This module handles:
//! - Aggregating unexpected URLs with the pages they were found on
//! - Writing the flat, nested and structured report files
//! - Collecting and triaging reports after a (batched) scan
//! - Exporting the page cache to disk

mod aggregate;
mod cache_export;
mod collect;
mod report;

pub use aggregate::UnexpectedLinks;
pub use cache_export::{cache_filename, export_page_cache, PAGE_CACHE_DIR};
pub use collect::{
    collect_reports, fingerprint, reports_present, CollectedReports, Triage, FINGERPRINT_LEN,
};
pub use report::{
    format_flat_report, format_json_report, format_nested_report, report_stem, ReportPaths,
    ReportWriter, REPORT_FILENAME_FRAGMENT,
};
