//! Loading rule sets from PSL text or compiled DAFSA files.
//!
//! Input starting with the `.DAFSA@PSL_` header is taken as a compiled
//! graph; anything else is parsed as list text.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::dafsa::{self, DafsaGraph, DAFSA_VERSION, HEADER_SIZE};
use crate::idna::IdnaMode;
use crate::list::{add_punycode_twins, parse_list, parse_list_bytes, ParsedList};
use crate::psl::{Psl, Rules};
use crate::rule::Rule;
use crate::table::SuffixTable;
use crate::types::SuffixCounts;

/// Error type for loading a rule set.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid DAFSA header")]
    InvalidDafsaHeader,
    #[error("Unsupported DAFSA version: {0}")]
    UnsupportedDafsaVersion(u32),
    #[error("Empty DAFSA graph")]
    EmptyGraph,
}

/// Options for building a context from list text.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Converter used for punycode twins and for queries on ASCII-only graphs
    pub idna: IdnaMode,
    /// Add an ASCII twin for every non-ASCII rule
    pub punycode_twins: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            idna: IdnaMode::Punycode,
            punycode_twins: true,
        }
    }
}

impl Psl {
    /// Load a list or compiled graph from a file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::load_file_with(path, &LoadOptions::default())
    }

    pub fn load_file_with(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, LoadError> {
        let path = path.as_ref();
        log::debug!("Loading suffix list from '{}'", path.display());
        let bytes = fs::read(path)?;
        Self::load_bytes_with(&bytes, options)
    }

    /// Load a list or compiled graph from a reader.
    pub fn load_reader(mut reader: impl Read) -> Result<Self, LoadError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::load_bytes(&bytes)
    }

    /// Load a list or compiled graph from memory.
    pub fn load_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::load_bytes_with(bytes, &LoadOptions::default())
    }

    pub fn load_bytes_with(bytes: &[u8], options: &LoadOptions) -> Result<Self, LoadError> {
        if dafsa::has_magic(bytes) {
            return Self::from_dafsa_with(bytes, options);
        }
        Ok(Self::from_parsed(parse_list_bytes(bytes), options))
    }

    /// Build a table context from list text.
    pub fn from_list_str(text: &str) -> Self {
        Self::from_list_str_with(text, &LoadOptions::default())
    }

    pub fn from_list_str_with(text: &str, options: &LoadOptions) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self::from_parsed(parse_list(text), options)
    }

    fn from_parsed(parsed: ParsedList, options: &LoadOptions) -> Self {
        if parsed.skipped > 0 {
            log::warn!("Skipped {} malformed lines", parsed.skipped);
        }
        let counts = parsed.counts();
        let mut rules = parsed.rules;

        if options.punycode_twins {
            let converter = options.idna.converter();
            let added = add_punycode_twins(&mut rules, converter.as_ref());
            log::debug!("Added {} punycode twins", added);
        }

        let table = SuffixTable::new(rules);
        log::debug!(
            "Loaded {} rules ({} suffixes, {} exceptions, {} wildcards)",
            table.len(),
            counts.suffixes,
            counts.exceptions,
            counts.wildcards
        );
        Self::new(Rules::Table(table), counts, options.idna)
    }

    /// Build a table context from already parsed rules.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let mut counts = SuffixCounts::default();
        let table = SuffixTable::new(rules);
        for rule in table.iter() {
            counts.add(rule.flags);
        }
        Self::new(Rules::Table(table), counts, IdnaMode::default())
    }

    /// Load a compiled graph including its file header.
    pub fn from_dafsa(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::from_dafsa_with(bytes, &LoadOptions::default())
    }

    pub fn from_dafsa_with(bytes: &[u8], options: &LoadOptions) -> Result<Self, LoadError> {
        let version = dafsa::header_version(bytes).ok_or(LoadError::InvalidDafsaHeader)?;
        if version != DAFSA_VERSION {
            return Err(LoadError::UnsupportedDafsaVersion(version));
        }

        let graph = DafsaGraph::from_raw(bytes[HEADER_SIZE..].to_vec());
        if graph.is_empty() {
            return Err(LoadError::EmptyGraph);
        }

        let counts = match graph.counts() {
            Ok(counts) => counts,
            Err(e) => {
                log::warn!("Could not count graph entries: {}", e);
                SuffixCounts::default()
            }
        };
        log::debug!(
            "Loaded {} byte graph ({}, {} suffixes, {} exceptions)",
            graph.len(),
            if graph.is_utf_mode() { "utf-8" } else { "ascii" },
            counts.suffixes,
            counts.exceptions
        );
        Ok(Self::new(Rules::Graph(graph), counts, options.idna))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dafsa::file_header;
    use crate::types::RuleFlags;

    const LIST: &str = "\
// ===BEGIN ICANN DOMAINS===
com
*.ck
!www.ck
商标
// ===END ICANN DOMAINS===
";

    #[test]
    fn test_load_text_bytes() {
        let psl = Psl::load_bytes(LIST.as_bytes()).expect("list should load");
        assert_eq!(psl.representation(), "table");
        assert_eq!(psl.suffix_count(), 3);
        assert_eq!(psl.exception_count(), 1);
        assert_eq!(psl.wildcard_count(), 1);
        assert_eq!(psl.lookup("xn--czr694b"), Some(RuleFlags::ICANN));
        assert_eq!(psl.lookup("商标"), Some(RuleFlags::ICANN));
    }

    #[test]
    fn test_twins_can_be_disabled() {
        let options = LoadOptions {
            punycode_twins: false,
            ..LoadOptions::default()
        };
        let psl = Psl::from_list_str_with(LIST, &options);
        assert_eq!(psl.lookup("xn--czr694b"), None);
    }

    #[test]
    fn test_load_reader_with_bom() {
        let text = format!("\u{feff}{LIST}");
        let psl = Psl::load_reader(text.as_bytes()).expect("list should load");
        assert_eq!(psl.lookup("com"), Some(RuleFlags::ICANN));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Psl::load_file("/nonexistent/public_suffix_list.dat").unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_load_skips_undecodable_lines() {
        let psl = Psl::load_bytes(b"com\nfo\xffo\nnet\n").expect("list should load");
        assert_eq!(psl.suffix_count(), 2);
        assert!(psl.is_public_suffix("com"));
        assert!(psl.is_public_suffix("net"));
        assert_eq!(psl.registrable_domain("www.example.net"), Some("example.net"));
    }

    #[test]
    fn test_dafsa_header_checks() {
        let err = Psl::load_bytes(b".DAFSA@PSL_1   \n\x81\xe1\x85").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedDafsaVersion(1)));

        let err = Psl::load_bytes(b".DAFSA@PSL_").unwrap_err();
        assert!(matches!(err, LoadError::InvalidDafsaHeader));

        let err = Psl::from_dafsa(&file_header()).unwrap_err();
        assert!(matches!(err, LoadError::EmptyGraph));
    }

    #[test]
    fn test_load_dafsa_bytes() {
        // {"a" -> ICANN|EXCEPTION, "ab" -> ICANN|WILDCARD}
        let mut bytes = file_header().to_vec();
        bytes.extend_from_slice(&[0x81, 0xE1, 0x02, 0x81, 0x85, 0x62, 0x86]);
        let psl = Psl::load_bytes(&bytes).expect("graph should load");
        assert_eq!(psl.representation(), "dafsa-ascii");
        assert_eq!(psl.exception_count(), 1);
        assert_eq!(psl.wildcard_count(), 1);
        assert_eq!(psl.lookup("ab"), Some(RuleFlags::ICANN | RuleFlags::WILDCARD));
    }
}
