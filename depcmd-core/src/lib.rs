//! depcmd-core: find command-execution call sites in Go module dependencies
//!
//! This library resolves every dependency declared in a `go.mod` to its
//! directory in the Go module cache and scans the sources found there for
//! literal command patterns such as `.Command(`.
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use depcmd_core::prelude::*;
//! use std::path::Path;
//!
//! let manifest = ModFile::load(Path::new("go.mod"))?;
//! let report = Audit::new(manifest).skip(["github.com/aws"]).run()?;
//! let summary = Summary::from_report(&report);
//!
//! for file in &report.matches {
//!     println!("{}: {} hits", file.file_path.display(), file.lines.len());
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`modfile`]: `go.mod` parsing
//! - [`locate`]: Manifest discovery in parent directories
//! - [`modcache`]: Module cache root discovery via `go env`
//! - [`resolve`]: Module path escaping and install directory resolution
//! - [`filter`]: Official-namespace and user skip-list pre-filters
//! - [`scan`]: Pruned traversal and line-by-line pattern matching
//! - [`audit`]: Builder API running the whole pipeline
//! - [`summary`]: Totals and per-pattern counts
//! - [`report`]: Plain and JSON output
//! - [`error`]: Typed error handling

pub mod audit;
pub mod config;
pub mod error;
pub mod filter;
pub mod locate;
pub mod logging;
pub mod modcache;
pub mod modfile;
pub mod prelude;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod summary;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{DepcmdError, DepcmdResult, IoResultExt};

// Builder API
pub use audit::{Audit, AuditReport, Dependency, DependencyOutcome, DependencyStatus};

// Configuration
pub use config::{load_config, DepcmdConfig, OutputConfig, CONFIG_FILE_NAME};

// Pre-filters
pub use filter::{is_official, DependencyFilter, ExclusionReason, OFFICIAL_PREFIXES};

// Manifest handling
pub use locate::{find_manifest_upwards, locate_manifest, LocatedManifest, MANIFEST_NAME};
pub use modfile::{ModFile, ModuleReference, ReplaceDirective};

// Cache discovery and resolution
pub use modcache::{discover_cache_root, GoEnv, GoToolEnv};
pub use resolve::{
    clean_version, escape_path, path_exists, resolve, resolve_replacement, resolve_requirement,
    unescape_path, ResolvedLocation,
};

// Logging
pub use logging::{init_structured_logging, log_error, log_info, log_warn};

// Reporting
pub use report::{print_json, print_plain, render_json, write_plain};
pub use summary::{PatternCount, Summary};

// Scanning
pub use scan::{
    collect_source_files, match_line, scan_file, scan_files, scan_tree, Candidates, FileMatch,
    LineMatch, ScanOptions, ScanResult, DEFAULT_PATTERNS,
};
