//! Post-scan checks run alongside the audit in CI
//!
//! - Feed well-formedness
//! - Report detection and webhook notification
//! - CDN geo consistency of exported pages

mod feeds;
mod geo;
mod notify;

pub use feeds::{check_feed, validate_feeds, FeedFailure};
pub use geo::{check_geo_consistency, compare_country_codes, country_code, GeoConsistency};
pub use notify::{check_for_output, summarize, Notifier, OutputCheck, RunContext};
