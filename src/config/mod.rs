//! Configuration module for Outlink-Audit
//!
//! This module handles loading, parsing, and validating the YAML documents the
//! auditor consumes (allowlists, extra URL lists, feed configs) and holds the
//! runtime settings for a scan.
//!
//! # Example
//!
//! ```no_run
//! use outlink_audit::config::load_allowlist_document;
//! use std::path::Path;
//!
//! let doc = load_allowlist_document(Path::new("data/allowlist.yml")).unwrap();
//! println!("Allowlist covers: {:?}", doc.relevant_hostnames);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AllowlistDocument, ExtraUrlsDocument, FeedConfigDocument, RetryPolicy, ScanSettings};

// Re-export parser functions
pub use parser::{compute_config_hash, load_allowlist_document, load_extra_urls, load_feed_config};
