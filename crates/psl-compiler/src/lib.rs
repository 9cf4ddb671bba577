//! Public Suffix List Compiler
//!
//! This crate compiles parsed suffix rules into the DAFSA graph format read
//! by `psl-core`.

pub mod builder;
pub mod optimizer;

pub use builder::{build_dafsa, build_dafsa_file, BuildError, DafsaOptions};
pub use optimizer::{optimize_rules, OptimizeOptions, OptimizeStats};
