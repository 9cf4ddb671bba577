//! Core type definitions shared by the suffix table, the DAFSA matcher and
//! the compiler.
//!
//! `RuleFlags` maps bit for bit onto the 4-bit return value stored in a
//! compiled DAFSA graph.

// =============================================================================
// Rule Flags (DAFSA return value bitmap)
// =============================================================================

bitflags::bitflags! {
    /// Flags attached to a suffix rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RuleFlags: u8 {
        /// `!label` - the domain is explicitly not a public suffix
        const EXCEPTION = 1 << 0;
        /// `*.label` - every direct child of the key is a public suffix
        const WILDCARD = 1 << 1;
        /// Rule comes from the ICANN section
        const ICANN = 1 << 2;
        /// Rule comes from the PRIVATE section
        const PRIVATE = 1 << 3;
    }
}

impl RuleFlags {
    /// Decode a DAFSA return value. Bits above the low nibble are ignored.
    #[inline]
    pub fn from_value(value: u8) -> Self {
        Self::from_bits_truncate(value & 0x0F)
    }

    /// Partition bits only.
    #[inline]
    pub fn partitions(self) -> Self {
        self & (Self::ICANN | Self::PRIVATE)
    }
}

// =============================================================================
// Suffix Type (partition filter for queries)
// =============================================================================

bitflags::bitflags! {
    /// Selects which partitions of the list take part in a query.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SuffixType: u8 {
        /// Only rules from the ICANN section
        const ICANN = 1 << 0;
        /// Only rules from the PRIVATE section
        const PRIVATE = 1 << 1;
        /// Disable the implicit `*` rule for single-label domains
        const NO_STAR_RULE = 1 << 2;
        /// Both partitions
        const ANY = Self::ICANN.bits() | Self::PRIVATE.bits();
    }
}

impl Default for SuffixType {
    fn default() -> Self {
        Self::ANY
    }
}

impl SuffixType {
    /// True when a rule carrying `flags` passes this filter.
    ///
    /// Asking for both partitions (or neither) accepts every rule.
    pub fn accepts(self, flags: RuleFlags) -> bool {
        let icann = self.contains(Self::ICANN);
        let private = self.contains(Self::PRIVATE);
        match (icann, private) {
            (true, false) => flags.contains(RuleFlags::ICANN),
            (false, true) => flags.contains(RuleFlags::PRIVATE),
            _ => true,
        }
    }

    /// Parse the names used on the command line: `any`, `icann` or `private`.
    pub fn from_cli_name(name: &str) -> Option<Self> {
        match name {
            "any" => Some(Self::ANY),
            "icann" => Some(Self::ICANN),
            "private" => Some(Self::PRIVATE),
            _ => None,
        }
    }
}

// =============================================================================
// Counters
// =============================================================================

/// Rule counters reported for a loaded context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuffixCounts {
    /// Rules that are not exceptions (wildcards included)
    pub suffixes: usize,
    /// Exception rules
    pub exceptions: usize,
    /// Wildcard rules
    pub wildcards: usize,
}

impl SuffixCounts {
    /// Tally one rule.
    pub fn add(&mut self, flags: RuleFlags) {
        if flags.contains(RuleFlags::EXCEPTION) {
            self.exceptions += 1;
        } else {
            self.suffixes += 1;
        }
        if flags.contains(RuleFlags::WILDCARD) {
            self.wildcards += 1;
        }
    }
}
