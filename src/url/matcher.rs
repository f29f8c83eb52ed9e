use crate::allowlist::AllowRule;
use std::borrow::Cow;

/// Checks an extracted URL against an allow rule
///
/// Literal lookup runs first. Extracted hrefs sometimes carry raw line
/// breaks, so newlines are escaped for the literal lookup only; regexes
/// always see the URL exactly as it was extracted. Any matching regex
/// accepts the URL.
///
/// # Examples
///
/// ```
/// use outlink_audit::allowlist::AllowRule;
/// use outlink_audit::url::is_allowed;
///
/// let rule = AllowRule::new(["/about/"], ["https://cdn\\.example\\.com/"]).unwrap();
///
/// assert!(is_allowed("/about/", &rule));
/// assert!(is_allowed("https://cdn.example.com/img.png", &rule));
/// assert!(!is_allowed("https://evil.example/x", &rule));
/// ```
pub fn is_allowed(url: &str, rule: &AllowRule) -> bool {
    let literal: Cow<'_, str> = if url.contains('\n') {
        Cow::Owned(url.replace('\n', "\\n"))
    } else {
        Cow::Borrowed(url)
    };

    if rule.literals().contains(literal.as_ref()) {
        return true;
    }

    rule.regexes().iter().any(|regex| regex.is_match(url))
}
