//! depcmd CLI - find command execution call sites in Go module dependencies.
//!
//! Features:
//! - go.mod discovery in parent directories
//! - Module cache resolution (case-escaped paths, `+incompatible` versions)
//! - Local and module `replace` directives
//! - Rayon-powered parallel scanning with deterministic output
//! - Plain (colored) or JSON reports

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use depcmd_core::{
    init_structured_logging, load_config, locate_manifest, log_error, log_info, log_warn,
    print_json, print_plain, Audit, DepcmdConfig, DepcmdError, ModFile, Summary,
    DEFAULT_PATTERNS,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Scan Go module dependencies for command execution patterns"
)]
pub struct Cli {
    /// Path to the go.mod file to parse
    #[arg(long, default_value = "go.mod")]
    file: String,

    /// Include packages from *.golang.org
    #[arg(long)]
    include_go_official: bool,

    /// Comma-separated list of packages to skip scanning
    #[arg(long, default_value = "")]
    skip: String,

    /// Disable color output
    #[arg(long)]
    no_color: bool,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Module cache directory (defaults to `go env GOMODCACHE`)
    #[arg(long, value_name = "DIR")]
    cache_root: Option<PathBuf>,

    /// Literal pattern to search for; repeat to give several (replaces the defaults)
    #[arg(long = "pattern", value_name = "TEXT")]
    patterns: Vec<String>,

    /// Also scan *_test.go files
    #[arg(long)]
    include_tests: bool,

    /// Keep filesystem order instead of sorting directory entries
    #[arg(long)]
    unordered: bool,

    /// Scan dependencies one at a time
    #[arg(long)]
    sequential: bool,
}

/// Effective settings after merging CLI flags over depcmd.toml.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    patterns: Vec<String>,
    skip: Vec<String>,
    include_official: bool,
    include_tests: bool,
    cache_root: Option<PathBuf>,
    json: bool,
    color: bool,
    ordered: bool,
    parallel: bool,
}

impl Settings {
    /// CLI flags win over the config file; skip lists from both are combined.
    fn merge(cli: &Cli, config: DepcmdConfig) -> Result<Self, DepcmdError> {
        let output = config.output.unwrap_or_default();

        let patterns = if !cli.patterns.is_empty() {
            cli.patterns.clone()
        } else if let Some(patterns) = config.patterns {
            patterns
        } else {
            DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
        };
        if patterns.is_empty() || patterns.iter().any(String::is_empty) {
            return Err(DepcmdError::invalid_argument(
                "at least one non-empty pattern is required",
            ));
        }

        let mut skip = config.skip.unwrap_or_default();
        for entry in parse_skip_list(&cli.skip) {
            if !skip.contains(&entry) {
                skip.push(entry);
            }
        }

        Ok(Self {
            patterns,
            skip,
            include_official: cli.include_go_official || config.include_official.unwrap_or(false),
            include_tests: cli.include_tests || config.include_tests.unwrap_or(false),
            cache_root: cli
                .cache_root
                .clone()
                .or_else(|| config.cache_root.map(PathBuf::from)),
            json: cli.json || output.format.as_deref() == Some("json"),
            color: !cli.no_color && output.color.unwrap_or(true),
            ordered: !cli.unordered,
            parallel: !cli.sequential,
        })
    }
}

/// Splits `a, b,,c` into trimmed, non-empty entries.
fn parse_skip_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    let located = locate_manifest(Path::new(&cli.file), &cwd)?;
    if located.from_parent {
        log_warn(&format!(
            "{} not found, using {}",
            cli.file,
            located.path.display()
        ));
        let notice = format!("Found go.mod in parent directory: {}", located.path.display());
        if cli.json {
            eprintln!("{}", notice);
        } else {
            println!("{}", notice);
        }
    }

    let manifest = ModFile::load(&located.path)
        .with_context(|| format!("Error parsing go.mod file {}", located.path.display()))?;

    let manifest_dir = located.path.parent().unwrap_or_else(|| Path::new("."));
    let config = match load_config(manifest_dir)? {
        Some(config) => {
            log_info(&format!("loaded config from {}", manifest_dir.display()));
            config
        }
        None => DepcmdConfig::default(),
    };
    let settings = Settings::merge(&cli, config)?;

    if !settings.color {
        colored::control::set_override(false);
    }

    let mut audit = Audit::new(manifest)
        .patterns(settings.patterns.iter().cloned())
        .skip(settings.skip.iter().cloned())
        .include_official(settings.include_official)
        .include_tests(settings.include_tests)
        .ordered(settings.ordered)
        .parallel(settings.parallel);
    if let Some(root) = &settings.cache_root {
        audit = audit.cache_root(root);
    }

    let report = audit.run().context("Error getting module cache path")?;
    let summary = Summary::from_report(&report);

    if settings.json {
        print_json(&report, &summary);
    } else {
        print_plain(&report, &summary).context("Failed to write report")?;
    }

    Ok(())
}

fn main() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] depcmd internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
        std::process::exit(2);
    }));

    // JSON diagnostics to stderr, filtered by RUST_LOG
    init_structured_logging();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log_error(&format!("{:#}", e));
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
