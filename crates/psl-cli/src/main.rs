//! Public Suffix List CLI
//!
//! CLI tool for querying the Public Suffix List and compiling it into DAFSA
//! graphs.

use std::fs;
use std::io::Write;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use psl_compiler::{build_dafsa_file, optimize_rules, DafsaOptions, OptimizeOptions};
use psl_core::list::parse_list_bytes;
use psl_core::{Context, Psl, RuleFlags, Rules, SuffixType};

#[derive(Parser)]
#[command(name = "psl")]
#[command(about = "Public Suffix List queries and DAFSA compiler")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Load PSL data (list text or compiled DAFSA) from a file
    #[arg(long, global = true, value_name = "FILE")]
    load_psl_file: Option<String>,

    /// Use the built-in PSL data [default]
    #[arg(long, global = true)]
    use_builtin_data: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check if domains are public suffixes
    IsPublicSuffix {
        /// Partition to consult: any, icann or private
        #[arg(long = "type", default_value = "any", value_parser = parse_suffix_type)]
        suffix_type: SuffixType,

        /// Do not treat unlisted single labels as public suffixes
        #[arg(long)]
        no_star_rule: bool,

        domains: Vec<String>,
    },

    /// Print the longest public suffix part of each domain
    UnregDomain { domains: Vec<String> },

    /// Print the shortest private suffix part of each domain
    RegDomain { domains: Vec<String> },

    /// Check if a cookie domain is acceptable for each host
    CookieDomainAcceptable {
        /// Domain attribute of the cookie
        #[arg(long)]
        cookie_domain: String,

        hosts: Vec<String>,
    },

    /// Print counters of the loaded data
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compile a PSL text file into a DAFSA graph
    Compile {
        /// Input list file
        #[arg(short, long)]
        input: String,

        /// Output graph file
        #[arg(short, long, default_value = "psl.dafsa")]
        output: String,

        /// Build an ASCII-only graph (non-ASCII rules are kept as punycode)
        #[arg(long)]
        ascii: bool,

        /// Do not add punycode twins for non-ASCII rules
        #[arg(long)]
        no_twins: bool,
    },

    /// Print every key stored in a list or graph file
    Dump {
        /// List or graph file to inspect
        #[arg(short, long)]
        input: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::IsPublicSuffix {
            suffix_type,
            no_star_rule,
            domains,
        } => {
            let ctx = load_context(&cli.source);
            let mut filter = suffix_type;
            if no_star_rule {
                filter |= SuffixType::NO_STAR_RULE;
            }
            print_lines(is_public_suffix_lines(ctx.as_deref(), &domains, filter))
        }
        Commands::UnregDomain { domains } => {
            let ctx = load_context(&cli.source);
            print_lines(unreg_domain_lines(ctx.as_deref(), &domains))
        }
        Commands::RegDomain { domains } => {
            let ctx = load_context(&cli.source);
            print_lines(reg_domain_lines(ctx.as_deref(), &domains))
        }
        Commands::CookieDomainAcceptable {
            cookie_domain,
            hosts,
        } => {
            let ctx = load_context(&cli.source);
            print_lines(cookie_domain_lines(ctx.as_deref(), &hosts, &cookie_domain))
        }
        Commands::Info { json } => {
            let ctx = load_context(&cli.source);
            cmd_info(ctx.as_ref(), json)
        }
        Commands::Compile {
            input,
            output,
            ascii,
            no_twins,
        } => cmd_compile(&input, &output, ascii, !no_twins, cli.verbose),
        Commands::Dump { input } => cmd_dump(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn parse_suffix_type(name: &str) -> Result<SuffixType, String> {
    SuffixType::from_cli_name(name).ok_or_else(|| format!("unknown type '{}'", name))
}

/// Load the selected data. A failed load is reported and yields no context,
/// so queries still run and print their fallback answers.
fn load_context(source: &SourceArgs) -> Option<Context> {
    let path = match (&source.load_psl_file, source.use_builtin_data) {
        (Some(path), false) => path,
        _ => return Some(Context::Builtin),
    };
    match Psl::load_file(path) {
        Ok(psl) => {
            log::debug!("Loaded {:?} from {}", psl, path);
            Some(Context::Loaded(psl))
        }
        Err(e) => {
            eprintln!("Failed to load PSL data from {}: {}", path, e);
            None
        }
    }
}

fn print_lines(lines: Vec<String>) -> Result<(), String> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        writeln!(out, "{}", line).map_err(|e| format!("Failed to write output: {}", e))?;
    }
    Ok(())
}

// =============================================================================
// Queries
// =============================================================================

fn is_public_suffix_lines(psl: Option<&Psl>, domains: &[String], filter: SuffixType) -> Vec<String> {
    domains
        .iter()
        .map(|domain| {
            let lower = psl_core::to_lowercase(domain);
            let public = psl_core::is_public_suffix_with(psl, Some(lower.as_str()), filter);
            format!("{}: {}", domain, u8::from(public))
        })
        .collect()
}

fn unreg_domain_lines(psl: Option<&Psl>, domains: &[String]) -> Vec<String> {
    domains
        .iter()
        .map(|domain| {
            let lower = psl_core::to_lowercase(domain);
            let value = psl_core::unregistrable_domain(psl, Some(lower.as_str()));
            format!("{}: {}", domain, value.unwrap_or("(null)"))
        })
        .collect()
}

fn reg_domain_lines(psl: Option<&Psl>, domains: &[String]) -> Vec<String> {
    domains
        .iter()
        .map(|domain| {
            let lower = psl_core::to_lowercase(domain);
            let value = psl_core::registrable_domain(psl, Some(lower.as_str()));
            format!("{}: {}", domain, value.unwrap_or("(null)"))
        })
        .collect()
}

fn cookie_domain_lines(psl: Option<&Psl>, hosts: &[String], cookie_domain: &str) -> Vec<String> {
    let cookie_domain = psl_core::to_lowercase(cookie_domain);
    hosts
        .iter()
        .map(|host| {
            let lower = psl_core::to_lowercase(host);
            let ok = psl_core::is_cookie_domain_acceptable(psl, Some(lower.as_str()), Some(cookie_domain.as_str()));
            format!("{}: {}", host, u8::from(ok))
        })
        .collect()
}

// =============================================================================
// Info
// =============================================================================

#[derive(Debug, Serialize)]
struct Info {
    source: &'static str,
    representation: &'static str,
    suffixes: usize,
    exceptions: usize,
    wildcards: usize,
}

impl Info {
    fn new(ctx: &Context) -> Self {
        Self {
            source: if ctx.is_builtin() { "builtin" } else { "file" },
            representation: ctx.representation(),
            suffixes: ctx.suffix_count(),
            exceptions: ctx.exception_count(),
            wildcards: ctx.wildcard_count(),
        }
    }
}

fn cmd_info(ctx: Option<&Context>, json: bool) -> Result<(), String> {
    let Some(ctx) = ctx else {
        println!("No PSL data available");
        return Ok(());
    };
    let info = Info::new(ctx);

    if json {
        let text = serde_json::to_string_pretty(&info)
            .map_err(|e| format!("Failed to serialize info: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    let prefix = if ctx.is_builtin() { "builtin " } else { "" };
    println!("{}suffixes: {}", prefix, info.suffixes);
    println!("{}exceptions: {}", prefix, info.exceptions);
    println!("{}wildcards: {}", prefix, info.wildcards);
    println!("representation: {}", info.representation);
    Ok(())
}

// =============================================================================
// Compile / Dump
// =============================================================================

fn cmd_compile(input: &str, output: &str, ascii: bool, twins: bool, verbose: bool) -> Result<(), String> {
    let start = Instant::now();

    let content = fs::read(input)
        .map_err(|e| format!("Failed to read '{}': {}", input, e))?;
    let line_count = content.split(|&b| b == b'\n').filter(|l| !l.is_empty()).count();

    let parsed = parse_list_bytes(&content);
    let counts = parsed.counts();
    let skipped = parsed.skipped;
    let mut rules = parsed.rules;
    let parse_time = start.elapsed();

    let opt_start = Instant::now();
    let options = OptimizeOptions {
        punycode_twins: twins,
        ascii_only: ascii,
        ..OptimizeOptions::default()
    };
    let stats = optimize_rules(&mut rules, &options);
    let opt_time = opt_start.elapsed();

    if verbose {
        println!(
            "  Optimizer: {} twins, {} merged, {} non-ASCII dropped",
            stats.twins, stats.merged, stats.dropped_non_ascii
        );
    }

    let build_start = Instant::now();
    let graph = build_dafsa_file(&rules, &DafsaOptions { utf_mode: !ascii })
        .map_err(|e| format!("Failed to build graph: {}", e))?;
    let build_time = build_start.elapsed();

    Psl::from_dafsa(&graph).map_err(|e| format!("Generated graph failed validation: {}", e))?;

    let mut file = fs::File::create(output)
        .map_err(|e| format!("Failed to create '{}': {}", output, e))?;
    file.write_all(&graph)
        .map_err(|e| format!("Failed to write '{}': {}", output, e))?;

    let total_time = start.elapsed();

    println!("Compiled '{}' to '{}'", input, output);
    println!("  Lines:    {} ({} skipped)", line_count, skipped);
    println!(
        "  Rules:    {} suffixes, {} exceptions, {} wildcards",
        counts.suffixes, counts.exceptions, counts.wildcards
    );
    println!("  Keys:     {} -> {}", stats.before, stats.after);
    println!("  Mode:     {}", if ascii { "ascii" } else { "utf-8" });
    println!("  Size:     {} bytes ({:.1} KB)", graph.len(), graph.len() as f64 / 1024.0);
    println!(
        "  Time:     {:.1}ms (parse: {:.1}ms, opt: {:.1}ms, build: {:.1}ms)",
        total_time.as_secs_f64() * 1000.0,
        parse_time.as_secs_f64() * 1000.0,
        opt_time.as_secs_f64() * 1000.0,
        build_time.as_secs_f64() * 1000.0,
    );

    Ok(())
}

fn cmd_dump(input: &str) -> Result<(), String> {
    let bytes = fs::read(input).map_err(|e| format!("Failed to read '{}': {}", input, e))?;
    let psl = Psl::load_bytes(&bytes).map_err(|e| format!("Invalid PSL data: {}", e))?;
    print_lines(dump_lines(&psl)?)
}

fn dump_lines(psl: &Psl) -> Result<Vec<String>, String> {
    let lines = match psl.rules() {
        Rules::Table(table) => table
            .iter()
            .map(|rule| format!("{}: {}", rule.key, flag_names(rule.flags)))
            .collect(),
        Rules::Graph(graph) => graph
            .entries()
            .map_err(|e| format!("Corrupt graph: {}", e))?
            .into_iter()
            .map(|entry| {
                format!(
                    "{}: {}",
                    String::from_utf8_lossy(&entry.key),
                    flag_names(RuleFlags::from_value(entry.value))
                )
            })
            .collect(),
    };
    Ok(lines)
}

fn flag_names(flags: RuleFlags) -> String {
    let names: Vec<&str> = flags.iter_names().map(|(name, _)| name).collect();
    names.join("|")
}
