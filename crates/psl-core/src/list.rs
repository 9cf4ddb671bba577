//! Public Suffix List text format.
//!
//! One rule per line, `//` comments, and the first whitespace-delimited
//! token of a line is the rule. Section markers in comments assign the
//! ICANN or PRIVATE partition to the rules that follow.

use std::collections::HashSet;

use crate::idna::IdnaConverter;
use crate::rule::Rule;
use crate::types::{RuleFlags, SuffixCounts};

const BEGIN_ICANN: &str = "===BEGIN ICANN DOMAINS===";
const END_ICANN: &str = "===END ICANN DOMAINS===";
const BEGIN_PRIVATE: &str = "===BEGIN PRIVATE DOMAINS===";
const END_PRIVATE: &str = "===END PRIVATE DOMAINS===";

/// Result of parsing a list.
#[derive(Debug, Clone, Default)]
pub struct ParsedList {
    pub rules: Vec<Rule>,
    /// Lines that looked like rules but failed to parse
    pub skipped: usize,
}

impl ParsedList {
    /// Counters over distinct keys.
    pub fn counts(&self) -> SuffixCounts {
        let mut seen: HashSet<(&str, bool)> = HashSet::new();
        let mut counts = SuffixCounts::default();
        for rule in &self.rules {
            if seen.insert((rule.key.as_str(), rule.is_exception())) {
                counts.add(rule.flags);
            }
        }
        counts
    }
}

/// Partition bits for rules outside any section.
fn unsectioned() -> RuleFlags {
    RuleFlags::ICANN | RuleFlags::PRIVATE
}

/// Line-by-line parser state shared by the text and byte entry points.
struct ListParser {
    parsed: ParsedList,
    section: RuleFlags,
}

impl ListParser {
    fn new() -> Self {
        Self {
            parsed: ParsedList::default(),
            section: unsectioned(),
        }
    }

    fn line(&mut self, idx: usize, raw_line: &str) {
        let line = raw_line.trim();
        if line.is_empty() {
            return;
        }

        if let Some(comment) = line.strip_prefix("//") {
            let comment = comment.trim();
            if comment.starts_with(BEGIN_ICANN) {
                self.section = RuleFlags::ICANN;
            } else if comment.starts_with(BEGIN_PRIVATE) {
                self.section = RuleFlags::PRIVATE;
            } else if comment.starts_with(END_ICANN) || comment.starts_with(END_PRIVATE) {
                self.section = unsectioned();
            }
            return;
        }

        let token = line.split_whitespace().next().unwrap_or(line);
        match Rule::parse(token, self.section) {
            Ok(rule) => self.parsed.rules.push(rule),
            Err(e) => {
                log::warn!("Skipping rule on line {}: {}", idx + 1, e);
                self.parsed.skipped += 1;
            }
        }
    }

    fn finish(self) -> ParsedList {
        log::debug!(
            "Parsed {} rules ({} skipped)",
            self.parsed.rules.len(),
            self.parsed.skipped
        );
        self.parsed
    }
}

/// Parse list text into rules. Malformed rules are logged and skipped.
pub fn parse_list(text: &str) -> ParsedList {
    let mut parser = ListParser::new();
    for (idx, line) in text.lines().enumerate() {
        parser.line(idx, line);
    }
    parser.finish()
}

/// Parse raw list bytes. Each line is decoded on its own, so a line that is
/// not valid UTF-8 is logged and skipped without affecting its neighbours.
pub fn parse_list_bytes(bytes: &[u8]) -> ParsedList {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    let mut parser = ListParser::new();
    for (idx, raw) in bytes.split(|&b| b == b'\n').enumerate() {
        let raw = raw.strip_suffix(b"\r".as_slice()).unwrap_or(raw);
        match std::str::from_utf8(raw) {
            Ok(line) => parser.line(idx, line),
            Err(e) => {
                log::warn!("Skipping line {}: not valid UTF-8 ({})", idx + 1, e);
                parser.parsed.skipped += 1;
            }
        }
    }
    parser.finish()
}

/// Append an ASCII twin for every non-ASCII rule. Returns the number added.
pub fn add_punycode_twins(rules: &mut Vec<Rule>, idna: &dyn IdnaConverter) -> usize {
    let mut twins = Vec::new();
    for rule in rules.iter().filter(|r| !r.key.is_ascii()) {
        match idna.to_ascii(&rule.key) {
            Some(ascii) if ascii != rule.key => twins.push(Rule::new(ascii, rule.flags)),
            Some(_) => {}
            None => log::debug!("No ASCII form for rule '{}'", rule.key),
        }
    }
    let added = twins.len();
    rules.extend(twins);
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idna::{NoIdna, Punycode};

    const LIST: &str = "\
// header comment
unsectioned

// ===BEGIN ICANN DOMAINS===
com
*.ck
!www.ck   trailing words are ignored
  uk
co.uk
*bad
a..b
商标
// ===END ICANN DOMAINS===

// ===BEGIN PRIVATE DOMAINS===
github.io
// ===END PRIVATE DOMAINS===
";

    #[test]
    fn test_sections_and_flags() {
        let parsed = parse_list(LIST);
        let find = |key: &str| {
            parsed
                .rules
                .iter()
                .find(|r| r.key == key)
                .map(|r| r.flags)
        };

        assert_eq!(find("unsectioned"), Some(RuleFlags::ICANN | RuleFlags::PRIVATE));
        assert_eq!(find("com"), Some(RuleFlags::ICANN));
        assert_eq!(find("ck"), Some(RuleFlags::ICANN | RuleFlags::WILDCARD));
        assert_eq!(find("www.ck"), Some(RuleFlags::ICANN | RuleFlags::EXCEPTION));
        assert_eq!(find("uk"), Some(RuleFlags::ICANN));
        assert_eq!(find("商标"), Some(RuleFlags::ICANN));
        assert_eq!(find("github.io"), Some(RuleFlags::PRIVATE));
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.rules.len(), 8);
    }

    #[test]
    fn test_counts() {
        let parsed = parse_list(LIST);
        assert_eq!(
            parsed.counts(),
            SuffixCounts {
                suffixes: 7,
                exceptions: 1,
                wildcards: 1
            }
        );
    }

    #[test]
    fn test_duplicate_rules_count_once() {
        let parsed = parse_list("com\ncom\n!www.ck\n*.ck\n");
        assert_eq!(parsed.rules.len(), 4);
        assert_eq!(parsed.counts().suffixes, 2);
        assert_eq!(parsed.counts().exceptions, 1);
    }

    #[test]
    fn test_bytes_skip_undecodable_lines() {
        let parsed = parse_list_bytes(b"\xEF\xBB\xBFcom\r\nfo\xffo\nnet\n// \xfe comment\n");
        let keys: Vec<&str> = parsed.rules.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["com", "net"]);
        assert_eq!(parsed.skipped, 2);
    }

    #[test]
    fn test_bytes_match_text_parser() {
        let from_bytes = parse_list_bytes(LIST.as_bytes());
        let from_text = parse_list(LIST);
        assert_eq!(from_bytes.rules, from_text.rules);
        assert_eq!(from_bytes.skipped, from_text.skipped);
    }

    #[test]
    fn test_punycode_twins() {
        let mut rules = parse_list(LIST).rules;
        let before = rules.len();
        assert_eq!(add_punycode_twins(&mut rules, &Punycode), 1);
        assert_eq!(rules.len(), before + 1);
        let twin = rules.last().unwrap();
        assert_eq!(twin.key, "xn--czr694b");
        assert_eq!(twin.flags, RuleFlags::ICANN);

        let mut rules = parse_list(LIST).rules;
        assert_eq!(add_punycode_twins(&mut rules, &NoIdna), 0);
    }
}
