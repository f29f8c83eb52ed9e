use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the hostname under test from a URL
///
/// The hostname is the host plus any non-default port, lowercased; this is
/// the form allowlists list in `relevant_hostnames`.
///
/// # Examples
///
/// ```
/// use outlink_audit::url::extract_hostname;
///
/// assert_eq!(extract_hostname("https://WWW.Example.com/en-US/").unwrap(), "www.example.com");
/// assert_eq!(extract_hostname("http://localhost:8000/").unwrap(), "localhost:8000");
/// assert_eq!(extract_hostname("https://example.com:443/").unwrap(), "example.com");
/// ```
pub fn extract_hostname(url: &str) -> UrlResult<String> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| UrlError::MissingHost(url.to_string()))?
        .to_lowercase();

    Ok(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Splits a URL string into its `scheme://authority` prefix and the remainder
///
/// Works on the raw text so the prefix can be substituted verbatim.
/// Returns `None` when the string has no scheme or no authority.
pub fn split_origin(url: &str) -> Option<(&str, &str)> {
    let scheme_end = url.find("://")?;
    if scheme_end == 0 {
        return None;
    }

    let authority_start = scheme_end + 3;
    let authority_len = url[authority_start..]
        .find(['/', '?', '#'])
        .unwrap_or(url.len() - authority_start);
    if authority_len == 0 {
        return None;
    }

    Some(url.split_at(authority_start + authority_len))
}

/// Scheme prefix used when building URLs from a bare hostname
///
/// Local development servers are served over plain HTTP.
pub fn scheme_for_host(hostname: &str) -> &'static str {
    if hostname.starts_with("localhost:") || hostname.starts_with("127.0.0.1:") {
        "http://"
    } else {
        "https://"
    }
}
