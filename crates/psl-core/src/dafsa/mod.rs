//! DAFSA graph format, lookup and enumeration
//!
//! A compiled rule set is a deterministic acyclic finite state automaton
//! serialized into a compact byte array. Lookups run directly over the bytes.

mod format;
mod lookup;
mod walk;

pub use format::*;
pub use lookup::lookup;
pub use walk::{entries, Entry, WalkError};

use crate::types::{RuleFlags, SuffixCounts};

/// An owned graph without its file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DafsaGraph {
    data: Vec<u8>,
    utf_mode: bool,
}

impl DafsaGraph {
    /// Wrap raw graph bytes. The mode is read from the trailing byte.
    pub fn from_raw(data: Vec<u8>) -> Self {
        let utf_mode = is_utf_mode(&data);
        Self { data, utf_mode }
    }

    /// Look up an exact key.
    #[inline]
    pub fn lookup(&self, key: &str) -> Option<RuleFlags> {
        lookup(&self.data, key.as_bytes()).map(RuleFlags::from_value)
    }

    /// True if keys are stored as raw UTF-8, false if the graph is ASCII only.
    #[inline]
    pub fn is_utf_mode(&self) -> bool {
        self.utf_mode
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All stored entries.
    pub fn entries(&self) -> Result<Vec<Entry>, WalkError> {
        entries(&self.data)
    }

    /// Rule counters derived from the stored entries.
    pub fn counts(&self) -> Result<SuffixCounts, WalkError> {
        let mut counts = SuffixCounts::default();
        for entry in self.entries()? {
            counts.add(RuleFlags::from_value(entry.value));
        }
        Ok(counts)
    }
}
