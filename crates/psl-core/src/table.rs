//! Legacy suffix table.
//!
//! A sorted array of rules searched with the same comparator that orders it.
//! Duplicate keys are merged on construction so every key appears once.

use crate::rule::{compare_keys, count_labels, Rule};
use crate::types::RuleFlags;

/// Sorted, deduplicated rule table.
#[derive(Debug, Clone, Default)]
pub struct SuffixTable {
    rules: Vec<Rule>,
    max_labels: usize,
}

impl SuffixTable {
    /// Sort `rules` and merge entries that share a key.
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by(|a, b| compare_keys(&a.key, a.nlabels, &b.key, b.nlabels));

        let mut merged: Vec<Rule> = Vec::with_capacity(rules.len());
        for rule in rules {
            match merged.last_mut() {
                Some(last) if last.key == rule.key => last.flags |= rule.flags,
                _ => merged.push(rule),
            }
        }

        // Most labels sort first.
        let max_labels = merged.first().map(|r| r.nlabels).unwrap_or(0);

        Self {
            rules: merged,
            max_labels,
        }
    }

    /// Look up an exact key.
    pub fn lookup(&self, key: &str) -> Option<RuleFlags> {
        let nlabels = count_labels(key);
        self.rules
            .binary_search_by(|rule| rule.cmp_key(key, nlabels))
            .ok()
            .map(|idx| self.rules[idx].flags)
    }

    /// Label count of the longest rule.
    #[inline]
    pub fn max_labels(&self) -> usize {
        self.max_labels
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rules: &[(&str, RuleFlags)]) -> SuffixTable {
        SuffixTable::new(rules.iter().map(|(k, f)| Rule::new(*k, *f)).collect())
    }

    #[test]
    fn test_lookup_hits_and_misses() {
        let t = table(&[
            ("com", RuleFlags::ICANN),
            ("co.uk", RuleFlags::ICANN),
            ("uk", RuleFlags::ICANN),
            ("github.io", RuleFlags::PRIVATE),
        ]);
        assert_eq!(t.lookup("com"), Some(RuleFlags::ICANN));
        assert_eq!(t.lookup("co.uk"), Some(RuleFlags::ICANN));
        assert_eq!(t.lookup("github.io"), Some(RuleFlags::PRIVATE));
        assert_eq!(t.lookup("io"), None);
        assert_eq!(t.lookup("example.com"), None);
        assert_eq!(t.lookup(""), None);
        assert_eq!(t.max_labels(), 2);
    }

    #[test]
    fn test_duplicates_merge_flags() {
        let t = table(&[
            ("ck", RuleFlags::ICANN),
            ("ck", RuleFlags::ICANN | RuleFlags::WILDCARD),
            ("ck", RuleFlags::PRIVATE),
        ]);
        assert_eq!(t.len(), 1);
        assert_eq!(
            t.lookup("ck"),
            Some(RuleFlags::ICANN | RuleFlags::WILDCARD | RuleFlags::PRIVATE)
        );
    }

    #[test]
    fn test_iter_is_sorted() {
        let t = table(&[
            ("b", RuleFlags::ICANN),
            ("a.b", RuleFlags::ICANN),
            ("aa", RuleFlags::ICANN),
            ("x.y.z", RuleFlags::ICANN),
        ]);
        let keys: Vec<&str> = t.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["x.y.z", "a.b", "b", "aa"]);
    }

    #[test]
    fn test_empty_table() {
        let t = SuffixTable::new(Vec::new());
        assert!(t.is_empty());
        assert_eq!(t.max_labels(), 0);
        assert_eq!(t.lookup("com"), None);
    }
}
