//! Per-hostname allow rules
//!
//! An [`AllowRule`] is the compiled form of an allowlist document: a set of
//! exact literals plus a list of regexes. Rules are loaded once per
//! `(hostname, path)` pair and shared for the rest of the run through an
//! [`AllowlistCache`].

use crate::config::{compute_config_hash, load_allowlist_document, AllowlistDocument};
use crate::ConfigError;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Compiled allow rules for one hostname
#[derive(Debug, Clone, Default)]
pub struct AllowRule {
    literals: HashSet<String>,
    regexes: Vec<Regex>,
}

impl AllowRule {
    /// Builds a rule from literal strings and regex sources
    ///
    /// Regexes match from the start of the URL, so `https://cdn\.example\.com/`
    /// accepts anything under that prefix without a leading `^`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` for the first regex that fails to compile.
    pub fn new<L, R>(literals: L, regexes: R) -> Result<Self, ConfigError>
    where
        L: IntoIterator,
        L::Item: Into<String>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let literals = literals.into_iter().map(Into::into).collect();
        let regexes = regexes
            .into_iter()
            .map(|source| compile_anchored(source.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { literals, regexes })
    }

    /// A rule that allows nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiles the rule lists of an allowlist document
    pub fn from_document(document: &AllowlistDocument) -> Result<Self, ConfigError> {
        Self::new(
            document.allowed_outbound_url_literals.iter().cloned(),
            &document.allowed_outbound_url_regexes,
        )
    }

    pub fn literals(&self) -> &HashSet<String> {
        &self.literals
    }

    pub fn regexes(&self) -> &[Regex] {
        &self.regexes
    }

    /// Returns true if the rule has neither literals nor regexes
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.regexes.is_empty()
    }

    /// Shorthand for [`crate::url::is_allowed`]
    pub fn allows(&self, url: &str) -> bool {
        crate::url::is_allowed(url, self)
    }
}

fn compile_anchored(source: &str) -> Result<Regex, ConfigError> {
    Regex::new(&format!("^(?:{})", source)).map_err(|e| ConfigError::InvalidPattern {
        pattern: source.to_string(),
        source: e,
    })
}

/// Loads the allow rule for `hostname` from the allowlist at `path`
///
/// The whole document is validated and its regexes compiled, so a bad
/// pattern fails the run even if it belongs to another site's section.
/// A hostname missing from `relevant_hostnames` yields an empty rule: every
/// outbound URL on that host is then reported as unexpected.
pub fn load_allow_rule(hostname: &str, path: &Path) -> Result<AllowRule, ConfigError> {
    tracing::info!("Seeking an appropriate allowlist in file {}", path.display());
    let document = load_allowlist_document(path)?;
    let rule = AllowRule::from_document(&document)?;

    if !document.relevant_hostnames.iter().any(|h| h == hostname) {
        tracing::warn!(
            "Could not find a config for {}, so treating all outbound URLs as unexpected",
            hostname
        );
        return Ok(AllowRule::empty());
    }

    match compute_config_hash(path) {
        Ok(hash) => tracing::info!(
            "Loaded allowlist for {} ({} literals, {} regexes, hash: {})",
            hostname,
            rule.literals.len(),
            rule.regexes.len(),
            hash
        ),
        Err(e) => tracing::debug!("Could not hash allowlist {}: {}", path.display(), e),
    }

    Ok(rule)
}

/// Run-scoped memo of loaded allow rules, keyed by `(hostname, path)`
#[derive(Debug, Default)]
pub struct AllowlistCache {
    rules: HashMap<(String, PathBuf), Arc<AllowRule>>,
}

impl AllowlistCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rule for `(hostname, path)`, loading it on first use
    pub fn load(&mut self, hostname: &str, path: &Path) -> Result<Arc<AllowRule>, ConfigError> {
        let key = (hostname.to_string(), path.to_path_buf());
        if let Some(rule) = self.rules.get(&key) {
            return Ok(Arc::clone(rule));
        }

        let rule = Arc::new(load_allow_rule(hostname, path)?);
        self.rules.insert(key, Arc::clone(&rule));
        Ok(rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
