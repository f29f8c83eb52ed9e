use crate::url::split_origin;

/// Rewrites a batch of URLs onto `origin` (a `scheme://authority` prefix)
///
/// Sitemaps served by an origin server often reference the CDN hostname;
/// rewriting lets the scan hit the origin directly. The first URL's prefix
/// is taken as the one shared by the whole batch. URLs that do not carry
/// that prefix are logged and left unchanged.
///
/// # Examples
///
/// ```
/// use outlink_audit::url::rewrite_origin;
///
/// let urls = vec![
///     "https://cdn.example.com/en-US/".to_string(),
///     "https://cdn.example.com/de/".to_string(),
/// ];
/// let rewritten = rewrite_origin("http://localhost:8000", urls);
/// assert_eq!(rewritten, vec!["http://localhost:8000/en-US/", "http://localhost:8000/de/"]);
/// ```
pub fn rewrite_origin(origin: &str, urls: Vec<String>) -> Vec<String> {
    let Some(candidate) = urls
        .first()
        .and_then(|first| split_origin(first))
        .map(|(prefix, _)| prefix.to_string())
    else {
        if let Some(first) = urls.first() {
            tracing::warn!("Cannot determine the hostname of {}, leaving batch as-is", first);
        }
        return urls;
    };

    if candidate == origin {
        tracing::debug!(
            "No need to replace the hostname on this batch of URLs: {}",
            candidate
        );
        return urls;
    }

    urls.into_iter()
        .map(|url| match url.strip_prefix(candidate.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with(['/', '?', '#']) => {
                format!("{}{}", origin, rest)
            }
            _ => {
                tracing::warn!(
                    "{} does not share the batch hostname {}, not rewriting it",
                    url,
                    candidate
                );
                url
            }
        })
        .collect()
}
