//! Collection and triage of written reports
//!
//! The reconciliation step after a (possibly batched) scan merges every
//! structured report in the output directory, then separates findings that
//! look like real URLs (allowlist candidates) from malformed content that
//! needs a human to look at it.

use crate::output::report::REPORT_FILENAME_FRAGMENT;
use crate::url::is_plausible_url;
use crate::AuditError;
use sha2::{Digest, Sha512};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Length of a candidate-set fingerprint, in hex characters
pub const FINGERPRINT_LEN: usize = 32;

/// Whether any report file exists in `dir`
///
/// A missing directory counts as no reports.
pub fn reports_present(dir: &Path) -> Result<bool, AuditError> {
    Ok(!report_files(dir, None)?.is_empty())
}

/// Structured reports merged across batches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedReports {
    /// Report files read, in name order
    pub sources: Vec<PathBuf>,

    /// Referring page → unexpected URLs found on it
    pub pages: BTreeMap<String, BTreeSet<String>>,

    /// Every unexpected URL across all reports
    pub unexpected_urls: BTreeSet<String>,
}

/// Merges every structured JSON report in `dir`
pub fn collect_reports(dir: &Path) -> Result<CollectedReports, AuditError> {
    let mut collected = CollectedReports::default();

    for path in report_files(dir, Some(".json"))? {
        tracing::info!("Reading report {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        let report: BTreeMap<String, Vec<String>> = serde_json::from_str(&content)?;

        for (page, urls) in report {
            collected.unexpected_urls.extend(urls.iter().cloned());
            collected.pages.entry(page).or_default().extend(urls);
        }
        collected.sources.push(path);
    }

    Ok(collected)
}

fn report_files(dir: &Path, suffix: Option<&str>) -> Result<Vec<PathBuf>, AuditError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(REPORT_FILENAME_FRAGMENT)
            && suffix.map_or(true, |suffix| name.ends_with(suffix))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Unexpected URLs split by what should happen to them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Triage {
    /// Plausible URLs that could be added to the allowlist
    pub allowlist_candidates: BTreeSet<String>,

    /// Malformed findings that warrant an issue instead
    pub issue_candidates: BTreeSet<String>,
}

impl Triage {
    pub fn from_urls<'a>(urls: impl IntoIterator<Item = &'a String>) -> Self {
        let mut triage = Self::default();
        for url in urls {
            if is_plausible_url(url) {
                triage.allowlist_candidates.insert(url.clone());
            } else {
                triage.issue_candidates.insert(url.clone());
            }
        }
        triage
    }

    pub fn is_empty(&self) -> bool {
        self.allowlist_candidates.is_empty() && self.issue_candidates.is_empty()
    }
}

/// Stable identity of a set of candidate URLs
///
/// Order-insensitive: the URLs are sorted before hashing.
///
/// # Examples
///
/// ```
/// use outlink_audit::output::fingerprint;
///
/// let a = fingerprint(["https://b.example/", "https://a.example/"]);
/// let b = fingerprint(["https://a.example/", "https://b.example/"]);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 32);
/// ```
pub fn fingerprint<I, S>(urls: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = urls.into_iter().map(|u| u.as_ref().to_string()).collect();
    sorted.sort();

    let digest = Sha512::digest(sorted.join("-").as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}
