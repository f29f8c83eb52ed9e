//! CDN geo consistency check
//!
//! Every page the CDN served during a scan should carry the same
//! `data-country-code` on its `<html>` element. Pages are read back from a
//! page-cache export.

use crate::AuditError;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::path::Path;

/// Outcome of a geo consistency check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoConsistency {
    /// Every page carried the same code
    Consistent { code: String, pages: usize },

    /// At least this many pages had no code at all
    MissingCode { pages_without_code: usize },

    /// Pages disagreed; also returned when there were no pages to compare
    Inconsistent { codes: BTreeSet<String> },
}

impl GeoConsistency {
    /// Process exit code for the outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Consistent { .. } => 0,
            Self::MissingCode { .. } => 98,
            Self::Inconsistent { .. } => 99,
        }
    }
}

/// Reads the `data-country-code` of a document's `<html>` element
pub fn country_code(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("html").ok()?;
    document
        .select(&selector)
        .next()?
        .value()
        .attr("data-country-code")
        .map(str::to_string)
}

/// Compares the country codes of a set of page bodies
pub fn compare_country_codes<'a>(pages: impl IntoIterator<Item = &'a str>) -> GeoConsistency {
    let mut codes = BTreeSet::new();
    let mut pages_checked = 0;
    let mut pages_without_code = 0;

    for page in pages {
        pages_checked += 1;
        match country_code(page) {
            Some(code) => {
                codes.insert(code);
            }
            None => pages_without_code += 1,
        }
    }

    if pages_without_code > 0 {
        return GeoConsistency::MissingCode { pages_without_code };
    }

    let mut iter = codes.iter();
    match (iter.next(), iter.next()) {
        (Some(code), None) => GeoConsistency::Consistent {
            code: code.clone(),
            pages: pages_checked,
        },
        _ => GeoConsistency::Inconsistent { codes },
    }
}

/// Checks every file in a page-cache export directory
pub fn check_geo_consistency(cache_dir: &Path) -> Result<GeoConsistency, AuditError> {
    let mut pages = Vec::new();

    if cache_dir.is_dir() {
        let mut paths: Vec<_> = std::fs::read_dir(cache_dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        paths.sort();

        for path in paths.into_iter().filter(|p| p.is_file()) {
            pages.push(std::fs::read_to_string(&path)?);
        }
    } else {
        tracing::warn!("No page cache found at {}", cache_dir.display());
    }

    let result = compare_country_codes(pages.iter().map(String::as_str));
    tracing::info!("Checked {} cached pages: {:?}", pages.len(), result);
    Ok(result)
}
