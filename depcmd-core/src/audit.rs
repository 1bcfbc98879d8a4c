//! Builder API that drives a whole run.
//!
//! ```rust,ignore
//! use depcmd_core::prelude::*;
//! use std::path::Path;
//!
//! let manifest = ModFile::load(Path::new("go.mod"))?;
//! let report = Audit::new(manifest)
//!     .skip(["github.com/aws"])
//!     .include_official(false)
//!     .run()?;
//!
//! println!("{} occurrences", Summary::from_report(&report).total_occurrences);
//! ```
//!
//! Dependencies are visited in manifest order (requirements, then
//! replacements) and their results are concatenated in that same order, also
//! when the scans themselves run in parallel.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::DepcmdResult;
use crate::filter::{DependencyFilter, ExclusionReason};
use crate::modcache::{discover_cache_root, GoEnv, GoToolEnv};
use crate::modfile::{ModFile, ModuleReference, ReplaceDirective};
use crate::resolve::{path_exists, resolve_replacement, resolve_requirement, ResolvedLocation};
use crate::scan::{scan_tree, FileMatch, ScanOptions};

/// One entry of the manifest that may be scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dependency {
    Require(ModuleReference),
    Replace(ReplaceDirective),
}

impl Dependency {
    /// Human-readable form, e.g. `a/b v1.0.0 (indirect)` or `a v1 => ../a`.
    pub fn label(&self) -> String {
        match self {
            Self::Require(req) => {
                let indirect = if req.indirect { " (indirect)" } else { "" };
                format!("{} {}{}", req.path, req.version, indirect)
            }
            Self::Replace(rep) => [
                rep.old_path.as_str(),
                rep.old_version.as_str(),
                "=>",
                rep.new_path.as_str(),
                rep.new_version.as_str(),
            ]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" "),
        }
    }
}

/// What happened to a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DependencyStatus {
    Scanned {
        files: usize,
        occurrences: usize,
        skipped: usize,
    },
    /// The resolved directory does not exist
    Missing,
    Excluded { reason: ExclusionReason },
    /// The directory exists but could not be opened
    ScanFailed { message: String },
}

/// Per-dependency record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyOutcome {
    pub dependency: Dependency,
    /// Absent for excluded dependencies, which are never resolved
    pub location: Option<ResolvedLocation>,
    pub status: DependencyStatus,
}

/// Result of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub manifest: PathBuf,
    pub module: String,
    pub go_version: Option<String>,
    pub cache_root: PathBuf,
    pub patterns: Vec<String>,
    pub include_tests: bool,
    pub include_official: bool,
    pub skip: Vec<String>,
    pub outcomes: Vec<DependencyOutcome>,
    /// Concatenated in dependency order
    pub matches: Vec<FileMatch>,
}

/// Builder for configuring a run.
#[derive(Debug, Clone)]
pub struct Audit {
    manifest: ModFile,
    cache_root: Option<PathBuf>,
    options: ScanOptions,
    filter: DependencyFilter,
}

impl Audit {
    /// Create a run over a parsed manifest with default settings.
    pub fn new(manifest: ModFile) -> Self {
        Self {
            manifest,
            cache_root: None,
            options: ScanOptions::default(),
            filter: DependencyFilter::default(),
        }
    }

    /// Use this module cache instead of asking the Go toolchain.
    pub fn cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }

    /// Replace the pattern list.
    pub fn patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Add module paths or substrings to skip.
    pub fn skip(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let extra = DependencyFilter::new(false, patterns).skip;
        self.filter.skip.extend(extra);
        self
    }

    /// Scan golang.org / google.golang.org modules too.
    pub fn include_official(mut self, enabled: bool) -> Self {
        self.filter.include_official = enabled;
        self
    }

    /// Scan `*_test.go` files too.
    pub fn include_tests(mut self, enabled: bool) -> Self {
        self.options.include_tests = enabled;
        self
    }

    /// Visit directory entries in name order.
    pub fn ordered(mut self, enabled: bool) -> Self {
        self.options.ordered = enabled;
        self
    }

    /// Scan dependencies and files concurrently.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.options.parallel = enabled;
        self
    }

    /// Manifest entries in visiting order.
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.manifest
            .require
            .iter()
            .cloned()
            .map(Dependency::Require)
            .chain(self.manifest.replace.iter().cloned().map(Dependency::Replace))
            .collect()
    }

    /// Run with the installed Go toolchain as cache-root source.
    pub fn run(&self) -> DepcmdResult<AuditReport> {
        self.run_with_env(&GoToolEnv::new())
    }

    /// Run with a custom Go environment source.
    ///
    /// Fails only if no cache root can be determined.
    pub fn run_with_env(&self, env: &impl GoEnv) -> DepcmdResult<AuditReport> {
        let cache_root = match &self.cache_root {
            Some(root) => root.clone(),
            None => discover_cache_root(env)?,
        };
        info!(cache_root = %cache_root.display(), "module cache located");

        let dependencies = self.dependencies();
        let visit = |dep: &Dependency| self.visit(dep, &cache_root);
        let visited: Vec<(DependencyOutcome, Vec<FileMatch>)> = if self.options.parallel {
            dependencies.par_iter().map(visit).collect()
        } else {
            dependencies.iter().map(visit).collect()
        };

        let mut outcomes = Vec::with_capacity(visited.len());
        let mut matches = Vec::new();
        for (outcome, found) in visited {
            outcomes.push(outcome);
            matches.extend(found);
        }

        Ok(AuditReport {
            manifest: self.manifest.source.clone(),
            module: self.manifest.module.clone(),
            go_version: self.manifest.go_version.clone(),
            cache_root,
            patterns: self.options.patterns.clone(),
            include_tests: self.options.include_tests,
            include_official: self.filter.include_official,
            skip: self.filter.skip.clone(),
            outcomes,
            matches,
        })
    }

    /// Filters, resolves and scans one dependency.
    fn visit(&self, dep: &Dependency, cache_root: &Path) -> (DependencyOutcome, Vec<FileMatch>) {
        let excluded = match dep {
            Dependency::Require(req) => self.filter.exclude_requirement(req),
            Dependency::Replace(rep) => self.filter.exclude_replacement(rep),
        };
        if let Some(reason) = excluded {
            info!(dependency = %dep.label(), %reason, "excluded");
            let outcome = DependencyOutcome {
                dependency: dep.clone(),
                location: None,
                status: DependencyStatus::Excluded { reason },
            };
            return (outcome, Vec::new());
        }

        let mut location = match dep {
            Dependency::Require(req) => resolve_requirement(req, cache_root),
            Dependency::Replace(rep) => resolve_replacement(rep, cache_root),
        };
        let root = scan_root(&location, self.manifest_dir());
        if root != location.path {
            location.exists = path_exists(&root);
        }

        let (status, found) = if !location.exists {
            info!(dependency = %dep.label(), path = %location.path.display(), "location not found");
            (DependencyStatus::Missing, Vec::new())
        } else {
            match scan_tree(&root, &self.options) {
                Ok(result) => {
                    info!(
                        dependency = %dep.label(),
                        files = result.matches.len(),
                        occurrences = result.occurrences(),
                        skipped = result.skipped,
                        "scanned"
                    );
                    let status = DependencyStatus::Scanned {
                        files: result.matches.len(),
                        occurrences: result.occurrences(),
                        skipped: result.skipped,
                    };
                    (status, result.matches)
                }
                Err(e) => {
                    warn!(dependency = %dep.label(), error = %e, "scan failed");
                    let status = DependencyStatus::ScanFailed {
                        message: e.to_string(),
                    };
                    (status, Vec::new())
                }
            }
        };

        let outcome = DependencyOutcome {
            dependency: dep.clone(),
            location: Some(location),
            status,
        };
        (outcome, found)
    }

    fn manifest_dir(&self) -> &Path {
        self.manifest
            .source
            .parent()
            .unwrap_or_else(|| Path::new(""))
    }
}

/// Directory actually walked for a location.
///
/// A relative local replacement is read from the manifest's directory, which
/// is what the Go toolchain resolves it against. The reported path stays the
/// literal one from the manifest.
fn scan_root(location: &ResolvedLocation, manifest_dir: &Path) -> PathBuf {
    if !location.is_local || location.path.is_absolute() || manifest_dir.as_os_str().is_empty() {
        return location.path.clone();
    }
    manifest_dir.join(&location.path)
}
