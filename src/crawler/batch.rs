//! Batch partitioning of the URL universe
//!
//! A batch descriptor `"{index}:{total}"` selects one contiguous slice of the
//! discovered URLs so separate processes can share a crawl without
//! coordinating. Slices for `1..=total` cover every URL exactly once.

use crate::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Which contiguous slice of the URL universe to work on (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpec {
    index: usize,
    total: usize,
}

impl BatchSpec {
    /// The whole universe as a single batch ("1:1")
    pub const NOOP: BatchSpec = BatchSpec { index: 1, total: 1 };

    /// Creates a batch descriptor, enforcing `1 <= index <= total`
    pub fn new(index: usize, total: usize) -> Result<Self, ConfigError> {
        if index < 1 || total < 1 || index > total {
            return Err(ConfigError::InvalidBatch(format!("{}:{}", index, total)));
        }
        Ok(Self { index, total })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Returns true if this descriptor selects everything
    pub fn is_noop(&self) -> bool {
        *self == Self::NOOP
    }

    /// Label embedded in report filenames: "all", or the batch index
    pub fn label(&self) -> String {
        if self.is_noop() {
            "all".to_string()
        } else {
            self.index.to_string()
        }
    }

    /// Size of every batch but (possibly) the last, for `len` items
    pub fn chunk_size(&self, len: usize) -> usize {
        len.div_ceil(self.total)
    }

    /// Selects this batch's slice of `items`
    ///
    /// The final batches may be shorter, or empty when `total` exceeds the
    /// number of items.
    ///
    /// # Examples
    ///
    /// ```
    /// use outlink_audit::crawler::BatchSpec;
    ///
    /// let urls = ["a", "b", "c", "d", "e"];
    /// let batch: BatchSpec = "2:2".parse().unwrap();
    /// assert_eq!(batch.select(&urls), &["d", "e"]);
    /// ```
    pub fn select<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let chunk_size = self.chunk_size(items.len());
        let start = ((self.index - 1) * chunk_size).min(items.len());
        let end = (start + chunk_size).min(items.len());
        &items[start..end]
    }
}

impl Default for BatchSpec {
    fn default() -> Self {
        Self::NOOP
    }
}

impl FromStr for BatchSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidBatch(s.to_string());

        let (index, total) = s.split_once(':').ok_or_else(invalid)?;
        let index = index.parse::<usize>().map_err(|_| invalid())?;
        let total = total.parse::<usize>().map_err(|_| invalid())?;

        Self::new(index, total).map_err(|_| invalid())
    }
}

impl fmt::Display for BatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.total)
    }
}
