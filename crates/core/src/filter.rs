//! Key filters
//!
//! Two kinds of filtering exist: substring exclusion applied to the keys
//! produced while uploading a directory, and exact/regex exclusion applied
//! to keys returned by a bucket listing.

use regex::Regex;

/// Returns true if any entry of `ignore` is a substring of `key`.
///
/// The comparison is case-sensitive and stops at the first match. An empty
/// set never ignores anything.
pub fn is_ignored<S: AsRef<str>>(key: &str, ignore: &[S]) -> bool {
    ignore.iter().any(|fragment| key.contains(fragment.as_ref()))
}

/// Owned set of substrings excluded from uploads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreFilter {
    fragments: Vec<String>,
}

impl IgnoreFilter {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        is_ignored(key, &self.fragments)
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// Options for [`crate::objects::list_keys`]
#[derive(Debug, Clone, Default)]
pub struct ListKeysOptions {
    /// Keys dropped when equal to one of these
    pub ignore_keys: Vec<String>,

    /// Keys dropped when this pattern matches anywhere in them
    pub ignore_pattern: Option<Regex>,

    /// Prefix every returned key with `/`
    pub start_slash: bool,
}

impl ListKeysOptions {
    pub fn ignore_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn ignore_pattern(mut self, pattern: Regex) -> Self {
        self.ignore_pattern = Some(pattern);
        self
    }

    pub fn start_slash(mut self, start_slash: bool) -> Self {
        self.start_slash = start_slash;
        self
    }

    /// Whether `key` should be kept in the listing
    pub fn accepts(&self, key: &str) -> bool {
        if self.ignore_keys.iter().any(|k| k == key) {
            return false;
        }
        match &self.ignore_pattern {
            Some(re) => !re.is_match(key),
            None => true,
        }
    }

    /// Apply the `start_slash` option to an accepted key
    pub fn present(&self, key: String) -> String {
        if self.start_slash {
            format!("/{key}")
        } else {
            key
        }
    }
}
