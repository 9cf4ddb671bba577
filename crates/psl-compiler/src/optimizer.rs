use std::collections::HashMap;

use psl_core::idna::IdnaMode;
use psl_core::list::add_punycode_twins;
use psl_core::Rule;

#[derive(Debug, Clone, Copy)]
pub struct OptimizeOptions {
    /// Add an ASCII twin for every non-ASCII rule
    pub punycode_twins: bool,
    /// Drop rules whose key is still non-ASCII (for ASCII mode graphs)
    pub ascii_only: bool,
    pub idna: IdnaMode,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            punycode_twins: true,
            ascii_only: false,
            idna: IdnaMode::Punycode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub twins: usize,
    pub merged: usize,
    pub dropped_non_ascii: usize,
}

pub fn optimize_rules(rules: &mut Vec<Rule>, options: &OptimizeOptions) -> OptimizeStats {
    let before = rules.len();

    let twins = if options.punycode_twins {
        let converter = options.idna.converter();
        add_punycode_twins(rules, converter.as_ref())
    } else {
        0
    };

    let mut dropped_non_ascii = 0usize;
    if options.ascii_only {
        rules.retain(|rule| {
            if rule.key.is_ascii() {
                true
            } else {
                dropped_non_ascii += 1;
                false
            }
        });
    }

    let mut seen: HashMap<String, usize> = HashMap::with_capacity(rules.len());
    let mut merged = 0usize;
    let mut unique: Vec<Rule> = Vec::with_capacity(rules.len());
    for rule in rules.drain(..) {
        match seen.get(&rule.key) {
            Some(&idx) => {
                unique[idx].flags |= rule.flags;
                merged += 1;
            }
            None => {
                seen.insert(rule.key.clone(), unique.len());
                unique.push(rule);
            }
        }
    }
    *rules = unique;

    let after = rules.len();

    OptimizeStats {
        before,
        after,
        twins,
        merged,
        dropped_non_ascii,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psl_core::list::parse_list;
    use psl_core::RuleFlags;

    const LIST: &str = "\
// ===BEGIN ICANN DOMAINS===
com
*.ck
ck
商标
// ===END ICANN DOMAINS===
// ===BEGIN PRIVATE DOMAINS===
com
// ===END PRIVATE DOMAINS===
";

    #[test]
    fn merges_duplicate_keys() {
        let mut rules = parse_list(LIST).rules;
        let stats = optimize_rules(&mut rules, &OptimizeOptions::default());

        assert_eq!(stats.before, 5);
        assert_eq!(stats.twins, 1);
        assert_eq!(stats.merged, 2);
        assert_eq!(stats.after, 4);

        let com = rules.iter().find(|r| r.key == "com").unwrap();
        assert_eq!(com.flags, RuleFlags::ICANN | RuleFlags::PRIVATE);
        let ck = rules.iter().find(|r| r.key == "ck").unwrap();
        assert_eq!(ck.flags, RuleFlags::ICANN | RuleFlags::WILDCARD);
    }

    #[test]
    fn ascii_only_keeps_twins() {
        let mut rules = parse_list(LIST).rules;
        let options = OptimizeOptions {
            ascii_only: true,
            ..OptimizeOptions::default()
        };
        let stats = optimize_rules(&mut rules, &options);

        assert_eq!(stats.dropped_non_ascii, 1);
        assert!(rules.iter().all(|r| r.key.is_ascii()));
        assert!(rules.iter().any(|r| r.key == "xn--czr694b"));
    }

    #[test]
    fn twins_can_be_disabled() {
        let mut rules = parse_list(LIST).rules;
        let options = OptimizeOptions {
            punycode_twins: false,
            ..OptimizeOptions::default()
        };
        let stats = optimize_rules(&mut rules, &options);
        assert_eq!(stats.twins, 0);
        assert!(rules.iter().any(|r| r.key == "商标"));
        assert!(!rules.iter().any(|r| r.key == "xn--czr694b"));
    }
}
