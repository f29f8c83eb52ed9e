use crate::config::types::{AllowlistDocument, FeedConfigDocument};
use crate::ConfigError;

/// Validates an allowlist document
///
/// Regex sources are not checked here; they are compiled (and rejected)
/// when the document is turned into an `AllowRule`. Hostnames are only
/// warned about: a host missing from the list gets an empty rule, so an
/// empty or odd list must not stop the scan.
pub fn validate_allowlist(document: &AllowlistDocument) -> Result<(), ConfigError> {
    if document.relevant_hostnames.is_empty() {
        tracing::warn!("Allowlist lists no relevant_hostnames; every host gets an empty rule");
    }

    for hostname in &document.relevant_hostnames {
        if let Err(e) = validate_hostname(hostname) {
            tracing::warn!("Allowlist hostname looks malformed: {}", e);
        }
    }

    if document
        .allowed_outbound_url_literals
        .iter()
        .any(|literal| literal.is_empty())
    {
        return Err(ConfigError::Validation(
            "allowed_outbound_url_literals cannot contain empty strings".to_string(),
        ));
    }

    Ok(())
}

/// Validates a feed config document
pub fn validate_feed_config(document: &FeedConfigDocument) -> Result<(), ConfigError> {
    validate_hostnames(&document.relevant_hostnames)?;

    if document.feed_paths.is_empty() {
        return Err(ConfigError::Validation(
            "feed_paths must list at least one feed".to_string(),
        ));
    }

    if document.feed_paths.iter().any(|path| path.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "feed_paths cannot contain empty paths".to_string(),
        ));
    }

    Ok(())
}

fn validate_hostnames(hostnames: &[String]) -> Result<(), ConfigError> {
    if hostnames.is_empty() {
        return Err(ConfigError::Validation(
            "relevant_hostnames must list at least one hostname".to_string(),
        ));
    }

    for hostname in hostnames {
        validate_hostname(hostname)?;
    }

    Ok(())
}

/// Validates a hostname, optionally carrying a port (e.g. "localhost:8000")
fn validate_hostname(hostname: &str) -> Result<(), ConfigError> {
    let (host, port) = match hostname.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (hostname, None),
    };

    if host.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Hostname '{}' has an empty host part",
            hostname
        )));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Hostname '{}' contains invalid characters",
            hostname
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "Hostname '{}' cannot start or end with '.' or '-'",
            hostname
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Hostname '{}' cannot contain consecutive dots",
            hostname
        )));
    }

    if let Some(port) = port {
        if port.parse::<u16>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Hostname '{}' has an invalid port",
                hostname
            )));
        }
    }

    Ok(())
}
