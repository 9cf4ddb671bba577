//! Single suffix rules and their parser.
//!
//! A rule is stored under its lookup key: `*.ck` becomes key `ck` with
//! [`RuleFlags::WILDCARD`], `!www.ck` becomes key `www.ck` with
//! [`RuleFlags::EXCEPTION`].

use std::cmp::Ordering;

use crate::types::RuleFlags;

/// Error type for rule parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("Empty rule")]
    Empty,
    #[error("Wildcard must be followed by a dot: {0}")]
    BareWildcard(String),
    #[error("Wildcard is only supported as the leftmost label: {0}")]
    InnerWildcard(String),
    #[error("Empty label in rule: {0}")]
    EmptyLabel(String),
}

/// A parsed suffix rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    /// Lowercase lookup key without `!` or `*.`
    pub key: String,
    /// Number of labels in `key`
    pub nlabels: usize,
    pub flags: RuleFlags,
}

impl Rule {
    /// Build a rule from an already normalized key.
    pub fn new(key: impl Into<String>, flags: RuleFlags) -> Self {
        let key = key.into();
        let nlabels = count_labels(&key);
        Self { key, nlabels, flags }
    }

    /// Parse one rule token as found in the list.
    ///
    /// `section` carries the partition bits of the enclosing list section.
    pub fn parse(text: &str, section: RuleFlags) -> Result<Self, RuleError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RuleError::Empty);
        }

        let mut flags = section.partitions();
        let mut body = text;

        if let Some(rest) = body.strip_prefix('!') {
            flags |= RuleFlags::EXCEPTION;
            body = rest;
        }

        if let Some(rest) = body.strip_prefix('*') {
            match rest.strip_prefix('.') {
                Some(rest) => {
                    flags |= RuleFlags::WILDCARD;
                    body = rest;
                }
                None => return Err(RuleError::BareWildcard(text.to_string())),
            }
        }

        if body.is_empty() {
            return Err(RuleError::Empty);
        }
        if body.contains('*') {
            return Err(RuleError::InnerWildcard(text.to_string()));
        }
        if body.split('.').any(str::is_empty) {
            return Err(RuleError::EmptyLabel(text.to_string()));
        }

        Ok(Self::new(body.to_lowercase(), flags))
    }

    #[inline]
    pub fn is_exception(&self) -> bool {
        self.flags.contains(RuleFlags::EXCEPTION)
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.flags.contains(RuleFlags::WILDCARD)
    }

    /// Legacy table ordering of this rule against a raw key.
    pub fn cmp_key(&self, key: &str, nlabels: usize) -> Ordering {
        compare_keys(&self.key, self.nlabels, key, nlabels)
    }
}

/// Count dot-separated labels.
#[inline]
pub fn count_labels(key: &str) -> usize {
    1 + key.bytes().filter(|&b| b == b'.').count()
}

/// Table order: most labels first, then shorter keys, then bytewise.
pub fn compare_keys(a: &str, a_labels: usize, b: &str, b_labels: usize) -> Ordering {
    b_labels
        .cmp(&a_labels)
        .then_with(|| a.len().cmp(&b.len()))
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}
