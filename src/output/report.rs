//! Report file generation
//!
//! Each scan with findings writes three files for its (hostname, batch):
//! a flat list of unexpected URLs, a nested text report showing where each
//! one was found, and a JSON report keyed by referring page. The files are
//! written one after another; a crash midway leaves a partial set.

use crate::output::aggregate::UnexpectedLinks;
use crate::AuditError;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fixed fragment at the start of every report filename
pub const REPORT_FILENAME_FRAGMENT: &str = "unexpected_urls_for";

/// Paths of one written report set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub flat: PathBuf,
    pub nested: PathBuf,
    pub json: PathBuf,
}

/// Builds the shared filename stem of a report set
///
/// The timestamp is second-resolution UTC with `-` in place of `:`, and
/// any port separator in the hostname gets the same treatment, so names are
/// safe for CI artifact storage.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use outlink_audit::output::report_stem;
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(
///     report_stem("localhost:8000", "2", now),
///     "unexpected_urls_for_localhost-8000_2_2024-03-09T14-05-07"
/// );
/// ```
pub fn report_stem(hostname: &str, batch_label: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}_{}",
        REPORT_FILENAME_FRAGMENT,
        hostname.replace(':', "-"),
        batch_label,
        now.format("%Y-%m-%dT%H-%M-%S")
    )
}

/// Formats the flat report: one unexpected URL per line
pub fn format_flat_report(links: &UnexpectedLinks) -> String {
    links.urls().collect::<Vec<_>>().join("\n")
}

/// Formats the nested report: one block per unexpected URL
pub fn format_nested_report(links: &UnexpectedLinks) -> String {
    let mut report = String::new();

    for (url, pages) in links.snapshot() {
        let occurrences = pages
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n\t");
        report.push_str(&format!(
            "\nUnexpected URL: {}\nFound in:\n\t{}\n",
            url, occurrences
        ));
    }

    report
}

/// Formats the structured report, keyed by referring page
pub fn format_json_report(links: &UnexpectedLinks) -> Result<String, serde_json::Error> {
    serde_json::to_string(&links.by_referring_page())
}

/// Writes report sets into an output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes the three reports, timestamped now
    pub fn write(
        &self,
        links: &UnexpectedLinks,
        hostname: &str,
        batch_label: &str,
    ) -> Result<ReportPaths, AuditError> {
        self.write_at(links, hostname, batch_label, Utc::now())
    }

    /// Writes the three reports with an explicit timestamp
    pub fn write_at(
        &self,
        links: &UnexpectedLinks,
        hostname: &str,
        batch_label: &str,
        now: DateTime<Utc>,
    ) -> Result<ReportPaths, AuditError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let stem = report_stem(hostname, batch_label, now);
        let paths = ReportPaths {
            flat: self.output_dir.join(format!("{}_flat.txt", stem)),
            nested: self.output_dir.join(format!("{}_nested.txt", stem)),
            json: self.output_dir.join(format!("{}_structured.json", stem)),
        };

        write_file(&paths.flat, &format_flat_report(links))?;
        tracing::info!("List of unexpected URLs output to {}", paths.flat.display());

        write_file(&paths.nested, &format_nested_report(links))?;
        tracing::info!(
            "List of unexpected URLs and their source pages output to {}",
            paths.nested.display()
        );

        write_file(&paths.json, &format_json_report(links)?)?;
        tracing::info!("JSON version of results output to {}", paths.json.display());

        Ok(paths)
    }
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())
}
