use crate::config::types::{AllowlistDocument, ExtraUrlsDocument, FeedConfigDocument};
use crate::config::validation::{validate_allowlist, validate_feed_config};
use crate::ConfigError;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads and deserializes a YAML document
fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let document = serde_yaml::from_str(&content)?;
    Ok(document)
}

/// Loads and validates an allowlist document
///
/// # Arguments
///
/// * `path` - Path to the YAML allowlist
///
/// # Returns
///
/// * `Ok(AllowlistDocument)` - Successfully loaded and validated document
/// * `Err(ConfigError)` - Failed to load, parse, or validate the document
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use outlink_audit::config::load_allowlist_document;
///
/// let doc = load_allowlist_document(Path::new("data/allowlist.yml")).unwrap();
/// println!("Hostnames: {:?}", doc.relevant_hostnames);
/// ```
pub fn load_allowlist_document(path: &Path) -> Result<AllowlistDocument, ConfigError> {
    let document: AllowlistDocument = load_yaml(path)?;
    validate_allowlist(&document)?;
    Ok(document)
}

/// Loads the extra paths file and turns each path into an absolute URL on `hostname`
///
/// An empty document yields no URLs.
pub fn load_extra_urls(path: &Path, hostname: &str) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let document: Option<ExtraUrlsDocument> = serde_yaml::from_str(&content)?;

    let Some(document) = document else {
        return Ok(Vec::new());
    };

    let scheme = crate::url::scheme_for_host(hostname);
    Ok(document
        .extra_urls_to_check
        .iter()
        .map(|path| format!("{}{}/{}", scheme, hostname, path))
        .collect())
}

/// Loads the feed config and checks that it covers `hostname`
///
/// Unlike the allowlist, an unconfigured hostname is an error here: there is
/// nothing useful to validate without a list of feed paths.
pub fn load_feed_config(path: &Path, hostname: &str) -> Result<FeedConfigDocument, ConfigError> {
    tracing::info!("Seeking a feed config in {}", path.display());
    let document: FeedConfigDocument = load_yaml(path)?;
    validate_feed_config(&document)?;

    if !document.relevant_hostnames.iter().any(|h| h == hostname) {
        return Err(ConfigError::Validation(format!(
            "Could not find a feed config for {} in {}",
            hostname,
            path.display()
        )));
    }

    Ok(document)
}

/// Computes a SHA-256 hash of a config file's content
///
/// Logged alongside each scan so reports can be traced back to the
/// allowlist revision that produced them.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}
