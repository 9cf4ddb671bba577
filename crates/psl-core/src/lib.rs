//! Public Suffix List Core Library
//!
//! This crate decides whether the rightmost labels of a domain form a public
//! suffix, and derives registrable domains and cookie domain acceptability
//! from that decision.
//!
//! # Architecture
//!
//! Rules are held in one of two interchangeable representations: a sorted
//! table parsed from list text, or a DAFSA graph compiled ahead of time by
//! `psl-compiler`. Lookups run directly over the graph bytes without
//! allocation and never panic on malformed input.
//!
//! # Missing arguments
//!
//! The free functions in [`domain`] take optional arguments. A missing
//! context or domain makes [`is_public_suffix`] return `true`: an absent
//! list reports every domain as a public suffix. Cookie checks fail closed
//! and the derivations return `None`.
//!
//! # Modules
//!
//! - `dafsa`: graph format, matcher and entry enumeration
//! - `domain`: registrable domains and cookie checks
//! - `idna`: pluggable conversion of non-ASCII domains
//! - `list`: list text parser
//! - `loader`: context construction from files and bytes
//! - `psl`: context type and the suffix decision policy
//! - `rule`: single rules and their ordering
//! - `table`: legacy sorted suffix table
//! - `types`: shared flag types

pub mod dafsa;
pub mod domain;
pub mod idna;
pub mod list;
pub mod loader;
pub mod psl;
pub mod rule;
pub mod table;
pub mod types;

// Re-export commonly used types
pub use domain::{
    is_cookie_domain_acceptable, is_public_suffix, is_public_suffix_with, registrable_domain,
    to_lowercase, unregistrable_domain,
};
pub use idna::{IdnaConverter, IdnaMode};
pub use loader::{LoadError, LoadOptions};
pub use psl::{Context, Psl, Rules};
pub use rule::{Rule, RuleError};
pub use types::{RuleFlags, SuffixCounts, SuffixType};
