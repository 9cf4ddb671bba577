//! Public Suffix List context and the suffix decision policy.
//!
//! A [`Psl`] holds one rule representation, either the legacy sorted table
//! or a compiled DAFSA graph, and answers "is this a public suffix?" for
//! both in the same way.
//!
//! # Examples
//!
//! ```
//! use psl_core::Psl;
//!
//! let psl = Psl::builtin();
//! assert!(psl.is_public_suffix("co.uk"));
//! assert!(!psl.is_public_suffix("example.co.uk"));
//! ```

use std::fmt;
use std::ops::Deref;

use once_cell::sync::Lazy;

use crate::dafsa::DafsaGraph;
use crate::idna::{IdnaConverter, IdnaMode};
use crate::rule::count_labels;
use crate::table::SuffixTable;
use crate::types::{RuleFlags, SuffixCounts, SuffixType};

// =============================================================================
// Rule Representations
// =============================================================================

/// The two interchangeable rule set representations.
#[derive(Debug, Clone)]
pub enum Rules {
    /// Sorted array searched by binary search
    Table(SuffixTable),
    /// Compiled DAFSA graph
    Graph(DafsaGraph),
}

impl Rules {
    #[inline]
    fn lookup(&self, key: &str) -> Option<RuleFlags> {
        match self {
            Self::Table(table) => table.lookup(key),
            Self::Graph(graph) => graph.lookup(key),
        }
    }
}

// =============================================================================
// Context
// =============================================================================

/// A loaded rule set. Immutable after construction and safe to share
/// between threads.
pub struct Psl {
    rules: Rules,
    counts: SuffixCounts,
    idna: Box<dyn IdnaConverter>,
}

/// Text of the list compiled into the library.
pub const BUILTIN_LIST: &str = include_str!("../data/public_suffix_list.dat");

static BUILTIN: Lazy<Psl> = Lazy::new(|| {
    let psl = Psl::from_list_str(BUILTIN_LIST);
    log::debug!(
        "Built-in list ready: {} suffixes, {} exceptions",
        psl.counts.suffixes,
        psl.counts.exceptions
    );
    psl
});

impl Psl {
    pub(crate) fn new(rules: Rules, counts: SuffixCounts, idna: IdnaMode) -> Self {
        Self {
            rules,
            counts,
            idna: idna.converter(),
        }
    }

    /// The process-wide list compiled into the crate.
    pub fn builtin() -> &'static Psl {
        &BUILTIN
    }

    /// Replace the IDNA converter used for ASCII-only rule sets.
    pub fn with_idna(mut self, idna: Box<dyn IdnaConverter>) -> Self {
        self.idna = idna;
        self
    }

    #[inline]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    #[inline]
    pub fn counts(&self) -> SuffixCounts {
        self.counts
    }

    /// Number of non-exception rules.
    #[inline]
    pub fn suffix_count(&self) -> usize {
        self.counts.suffixes
    }

    #[inline]
    pub fn exception_count(&self) -> usize {
        self.counts.exceptions
    }

    #[inline]
    pub fn wildcard_count(&self) -> usize {
        self.counts.wildcards
    }

    /// Short description of the representation.
    pub fn representation(&self) -> &'static str {
        match &self.rules {
            Rules::Table(_) => "table",
            Rules::Graph(graph) if graph.is_utf_mode() => "dafsa-utf8",
            Rules::Graph(_) => "dafsa-ascii",
        }
    }

    /// True if rule keys are ASCII only, so non-ASCII input must be converted.
    #[inline]
    fn needs_ascii_keys(&self) -> bool {
        matches!(&self.rules, Rules::Graph(graph) if !graph.is_utf_mode())
    }

    /// Raw rule lookup for an exact key.
    #[inline]
    pub fn lookup(&self, key: &str) -> Option<RuleFlags> {
        self.rules.lookup(key)
    }

    // =========================================================================
    // Decision Policy
    // =========================================================================

    /// Check whether `domain` is a public suffix, considering both partitions.
    ///
    /// `domain` is expected in lowercase UTF-8 or punycode.
    pub fn is_public_suffix(&self, domain: &str) -> bool {
        self.is_public_suffix_with(domain, SuffixType::ANY)
    }

    /// Check whether `domain` is a public suffix under `filter`.
    pub fn is_public_suffix_with(&self, domain: &str, filter: SuffixType) -> bool {
        let domain = domain.strip_prefix('.').unwrap_or(domain);
        let nlabels = count_labels(domain);

        // Prevailing `*` rule.
        if nlabels == 1 && !filter.contains(SuffixType::NO_STAR_RULE) {
            return true;
        }

        let converted;
        let domain = if !domain.is_ascii() && self.needs_ascii_keys() {
            match self.idna.to_ascii(domain) {
                Some(ascii) => {
                    converted = ascii;
                    converted.as_str()
                }
                None => {
                    log::debug!("IDNA conversion failed for '{}', using raw bytes", domain);
                    domain
                }
            }
        } else {
            domain
        };

        if let Rules::Table(table) = &self.rules {
            if nlabels > table.max_labels() + 1 {
                return false;
            }
        }

        let full = self.rules.lookup(domain);
        if let Some(flags) = full.filter(|&f| filter.accepts(f)) {
            return !flags.contains(RuleFlags::EXCEPTION);
        }

        if let Some((_, parent)) = domain.split_once('.') {
            let parent_flags = self.rules.lookup(parent).filter(|&f| filter.accepts(f));
            if parent_flags.is_some_and(|f| f.contains(RuleFlags::WILDCARD)) {
                return !full.is_some_and(|f| f.contains(RuleFlags::EXCEPTION));
            }
        }

        false
    }
}

impl fmt::Debug for Psl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Psl")
            .field("representation", &self.representation())
            .field("counts", &self.counts)
            .finish_non_exhaustive()
    }
}

/// Either the shared built-in list or a caller-owned one.
///
/// Dropping a `Loaded` context releases it; the built-in list lives for the
/// whole process.
#[derive(Debug)]
pub enum Context {
    Builtin,
    Loaded(Psl),
}

impl Context {
    #[inline]
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::Builtin
    }
}

impl From<Psl> for Context {
    fn from(psl: Psl) -> Self {
        Self::Loaded(psl)
    }
}

impl Deref for Context {
    type Target = Psl;

    fn deref(&self) -> &Psl {
        match self {
            Self::Builtin => Psl::builtin(),
            Self::Loaded(psl) => psl,
        }
    }
}
