//! Registrable domain derivation and cookie domain checks.
//!
//! Both derivations walk the domain from left to right, so entries like
//! `forgot.his.name` are found even though `his.name` is not in the list.
//!
//! The free functions accept optional arguments. A missing context or
//! domain fails open: it counts as public, derives nothing, and never makes
//! a cookie domain acceptable.

use std::net::IpAddr;

use crate::psl::Psl;
use crate::types::SuffixType;

impl Psl {
    /// Longest public suffix part of `domain`.
    pub fn unregistrable_domain<'a>(&self, domain: &'a str) -> Option<&'a str> {
        let mut rest = domain;
        while !self.is_public_suffix(rest) {
            let (_, parent) = rest.split_once('.')?;
            rest = parent;
        }
        Some(rest)
    }

    /// Shortest part of `domain` that is not a public suffix, i.e. the
    /// public suffix plus one label.
    pub fn registrable_domain<'a>(&self, domain: &'a str) -> Option<&'a str> {
        if domain.starts_with('.') {
            return None;
        }
        let mut registrable = None;
        let mut rest = domain;
        while !self.is_public_suffix(rest) {
            match rest.split_once('.') {
                Some((_, parent)) => {
                    registrable = Some(rest);
                    rest = parent;
                }
                None => break,
            }
        }
        registrable
    }

    /// Check whether a cookie for `cookie_domain` may be set by `hostname`.
    pub fn is_cookie_domain_acceptable(&self, hostname: &str, cookie_domain: &str) -> bool {
        let cookie_domain = cookie_domain.trim_start_matches('.');

        if hostname == cookie_domain {
            return true;
        }

        // IP literals must match exactly (RFC 6265, 5.1.3).
        if hostname.parse::<IpAddr>().is_ok() {
            return false;
        }

        if cookie_domain.len() >= hostname.len() {
            return false;
        }

        let split = hostname.len() - cookie_domain.len();
        if !hostname.ends_with(cookie_domain) || hostname.as_bytes().get(split - 1) != Some(&b'.') {
            return false;
        }

        // The cookie domain must be longer than the public suffix of the host.
        match self.unregistrable_domain(hostname) {
            None => true,
            Some(public) => cookie_domain.len() > public.len(),
        }
    }
}

// =============================================================================
// Optional-argument API
// =============================================================================

/// See [`Psl::is_public_suffix`]. Missing arguments count as public.
pub fn is_public_suffix(psl: Option<&Psl>, domain: Option<&str>) -> bool {
    is_public_suffix_with(psl, domain, SuffixType::ANY)
}

/// See [`Psl::is_public_suffix_with`]. Missing arguments count as public.
pub fn is_public_suffix_with(psl: Option<&Psl>, domain: Option<&str>, filter: SuffixType) -> bool {
    match (psl, domain) {
        (Some(psl), Some(domain)) => psl.is_public_suffix_with(domain, filter),
        _ => true,
    }
}

/// See [`Psl::unregistrable_domain`].
pub fn unregistrable_domain<'a>(psl: Option<&Psl>, domain: Option<&'a str>) -> Option<&'a str> {
    psl?.unregistrable_domain(domain?)
}

/// See [`Psl::registrable_domain`].
pub fn registrable_domain<'a>(psl: Option<&Psl>, domain: Option<&'a str>) -> Option<&'a str> {
    psl?.registrable_domain(domain?)
}

/// See [`Psl::is_cookie_domain_acceptable`]. Missing arguments are never
/// acceptable.
pub fn is_cookie_domain_acceptable(
    psl: Option<&Psl>,
    hostname: Option<&str>,
    cookie_domain: Option<&str>,
) -> bool {
    match (psl, hostname, cookie_domain) {
        (Some(psl), Some(hostname), Some(cookie_domain)) => {
            psl.is_cookie_domain_acceptable(hostname, cookie_domain)
        }
        _ => false,
    }
}

/// Lowercase a domain the way list keys are normalized.
pub fn to_lowercase(domain: &str) -> String {
    domain.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> &'static Psl {
        Psl::builtin()
    }

    #[test]
    fn test_is_public_suffix_vectors() {
        let psl = builtin();
        let cases = [
            ("www.example.com", false),
            ("com.ar", true),
            ("www.com.ar", false),
            ("cc.ar.us", true),
            (".cc.ar.us", true),
            ("www.cc.ar.us", false),
            ("www.ck", false),
            ("abc.www.ck", false),
            ("xxx.ck", true),
            ("www.xxx.ck", false),
            ("商标", true),
            ("www.商标", false),
            ("xn--czr694b", true),
            ("公司.cn", true),
            ("xn--55qx5d.cn", true),
            ("example.公司.cn", false),
        ];
        for (domain, expected) in cases {
            assert_eq!(psl.is_public_suffix(domain), expected, "{domain}");
        }
    }

    #[test]
    fn test_partition_queries() {
        let psl = builtin();
        assert!(psl.is_public_suffix_with("blogspot.com", SuffixType::PRIVATE));
        assert!(!psl.is_public_suffix_with("blogspot.com", SuffixType::ICANN));
        assert!(psl.is_public_suffix_with("co.uk", SuffixType::ICANN));
        assert!(!psl.is_public_suffix_with("co.uk", SuffixType::PRIVATE));
        assert!(!psl.is_public_suffix_with(
            "nosuchtld",
            SuffixType::ANY | SuffixType::NO_STAR_RULE
        ));
    }

    #[test]
    fn test_unregistrable_domain() {
        let psl = builtin();
        assert_eq!(psl.unregistrable_domain("www.example.com"), Some("com"));
        assert_eq!(psl.unregistrable_domain("www.example.co.uk"), Some("co.uk"));
        assert_eq!(psl.unregistrable_domain("com"), Some("com"));
        assert_eq!(
            psl.unregistrable_domain("www.dkg.forgot.his.name"),
            Some("forgot.his.name")
        );
        assert_eq!(psl.unregistrable_domain("www.his.name"), Some("name"));
        assert_eq!(psl.unregistrable_domain("a.b.xxx.ck"), Some("xxx.ck"));
    }

    const REGISTRABLE_CASES: &[(&str, Option<&str>)] = &[
        ("com", None),
        ("example.com", Some("example.com")),
        ("www.example.com", Some("example.com")),
        ("a.b.example.co.uk", Some("example.co.uk")),
        ("co.uk", None),
        ("www.example.com.br", Some("example.com.br")),
        ("www.example.co.nz", Some("example.co.nz")),
        ("com.br", None),
        ("www.ck", Some("www.ck")),
        ("www.www.ck", Some("www.ck")),
        ("xxx.ck", None),
        ("a.xxx.ck", Some("a.xxx.ck")),
        ("b.a.xxx.ck", Some("a.xxx.ck")),
        ("city.kawasaki.jp", Some("city.kawasaki.jp")),
        ("www.city.kawasaki.jp", Some("city.kawasaki.jp")),
        ("test.kawasaki.jp", None),
        ("b.test.kawasaki.jp", Some("b.test.kawasaki.jp")),
        ("www.dkg.forgot.his.name", Some("dkg.forgot.his.name")),
        ("foo.github.io", Some("foo.github.io")),
        ("example.zz", Some("example.zz")),
        ("shishi.商标", Some("shishi.商标")),
        ("www.shishi.公司.cn", Some("shishi.公司.cn")),
        (".example.com", None),
    ];

    #[test]
    fn test_registrable_domain() {
        let psl = builtin();
        for &(domain, expected) in REGISTRABLE_CASES {
            assert_eq!(psl.registrable_domain(domain), expected, "{domain}");
        }
    }

    #[test]
    fn test_registrable_domain_is_idempotent() {
        let psl = builtin();
        for &(domain, _) in REGISTRABLE_CASES {
            if let Some(reg) = psl.registrable_domain(domain) {
                assert_eq!(psl.registrable_domain(reg), Some(reg), "{domain}");
                assert!(!psl.is_public_suffix(reg), "{domain}");
            }
        }
    }

    #[test]
    fn test_second_level_country_suffixes() {
        let psl = builtin();
        assert!(psl.is_public_suffix("com.br"));
        assert!(psl.is_public_suffix("co.nz"));
        assert_eq!(psl.unregistrable_domain("www.example.com.br"), Some("com.br"));
        assert!(!psl.is_cookie_domain_acceptable("www.example.com.br", "com.br"));
        assert!(!psl.is_cookie_domain_acceptable("www.example.co.nz", "co.nz"));
        assert!(psl.is_cookie_domain_acceptable("www.example.co.nz", "example.co.nz"));
    }

    #[test]
    fn test_registrable_is_longer_than_unregistrable() {
        let psl = builtin();
        for domain in ["www.example.com", "a.b.c.co.uk", "x.y.xxx.ck", "w.shishi.商标"] {
            let reg = psl.registrable_domain(domain).unwrap();
            let unreg = psl.unregistrable_domain(domain).unwrap();
            assert!(reg.len() > unreg.len(), "{domain}");
            assert!(domain.ends_with(reg));
            assert!(reg.ends_with(unreg));
        }
    }

    #[test]
    fn test_cookie_domain_vectors() {
        let psl = builtin();
        let cases = [
            ("www.dkg.forgot.his.name", "www.dkg.forgot.his.name", true),
            ("www.dkg.forgot.his.name", "dkg.forgot.his.name", true),
            ("www.dkg.forgot.his.name", "forgot.his.name", false),
            ("www.dkg.forgot.his.name", "his.name", false),
            ("www.dkg.forgot.his.name", "name", false),
            ("www.his.name", "www.his.name", true),
            ("www.his.name", "his.name", true),
            ("www.his.name", "name", false),
            ("www.example.com", "www.example.com", true),
            ("www.example.com", "example.com", true),
            ("www.example.com", ".example.com", true),
            ("www.example.com", "com", false),
            ("www.example.com", "example.org", false),
            ("www.sa.gov.au", "sa.gov.au", false),
            ("www.educ.ar", "educ.ar", true),
            ("wwwexample.com", "example.com", false),
        ];
        for (host, cookie, expected) in cases {
            assert_eq!(
                psl.is_cookie_domain_acceptable(host, cookie),
                expected,
                "{host} / {cookie}"
            );
        }
    }

    #[test]
    fn test_cookie_domain_ip_literals() {
        let psl = builtin();
        assert!(psl.is_cookie_domain_acceptable("192.168.0.1", "192.168.0.1"));
        assert!(!psl.is_cookie_domain_acceptable("192.168.0.1", "168.0.1"));
        assert!(!psl.is_cookie_domain_acceptable("192.168.0.1", "0.1"));
        assert!(psl.is_cookie_domain_acceptable("::1", "::1"));
    }

    #[test]
    fn test_optional_arguments() {
        let psl = Some(builtin());
        assert!(is_public_suffix(None, Some("example.com")));
        assert!(is_public_suffix(psl, None));
        assert!(!is_public_suffix(psl, Some("example.com")));
        assert!(is_public_suffix_with(None, None, SuffixType::ICANN));

        assert_eq!(registrable_domain(None, Some("www.example.com")), None);
        assert_eq!(registrable_domain(psl, None), None);
        assert_eq!(
            registrable_domain(psl, Some("www.example.com")),
            Some("example.com")
        );
        assert_eq!(unregistrable_domain(None, Some("www.example.com")), None);
        assert_eq!(unregistrable_domain(psl, Some("www.example.com")), Some("com"));

        assert!(!is_cookie_domain_acceptable(None, Some("a.com"), Some("a.com")));
        assert!(!is_cookie_domain_acceptable(psl, None, Some("a.com")));
        assert!(!is_cookie_domain_acceptable(psl, Some("a.com"), None));
        assert!(is_cookie_domain_acceptable(psl, Some("a.com"), Some("a.com")));
    }

    #[test]
    fn test_registrable_agrees_with_publicsuffix_crate() {
        use publicsuffix::{List, Psl as _};

        let text = include_str!("../data/public_suffix_list.dat");
        let reference: List = text.parse().expect("reference list should parse");
        let psl = builtin();

        for name in [
            "com",
            "example.com",
            "www.example.com",
            "example.co.uk",
            "a.b.example.co.uk",
            "www.ck",
            "www.www.ck",
            "a.xxx.ck",
            "city.kawasaki.jp",
            "www.city.kawasaki.jp",
            "b.test.kawasaki.jp",
            "github.io",
            "foo.github.io",
            "dkg.forgot.his.name",
            "www.his.name",
            "foo.bar.blogspot.co.uk",
            "a.b.compute.amazonaws.com",
            "www.educ.ar",
            "example.zz",
        ] {
            let expected = reference
                .domain(name.as_bytes())
                .map(|d| String::from_utf8_lossy(d.as_bytes()).into_owned());
            assert_eq!(
                psl.registrable_domain(name).map(str::to_string),
                expected,
                "{name}"
            );
        }
    }

    #[test]
    fn test_to_lowercase() {
        assert_eq!(to_lowercase("WWW.Example.COM"), "www.example.com");
        assert_eq!(to_lowercase("ÄÖÜ.DE"), "äöü.de");
    }
}
