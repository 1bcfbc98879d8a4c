//! Dependency pre-filters, applied before anything is resolved or scanned.

use serde::Serialize;

use crate::modfile::{ModuleReference, ReplaceDirective};

/// Namespaces maintained by the Go project itself.
pub const OFFICIAL_PREFIXES: &[&str] = &["golang.org/", "google.golang.org/"];

/// Why a dependency was left out of the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Under one of [`OFFICIAL_PREFIXES`]
    Official,
    /// Matched a user skip pattern
    UserSkip(String),
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Official => write!(f, "Go official package"),
            Self::UserSkip(p) => write!(f, "user-specified ({})", p),
        }
    }
}

/// Returns true for modules under an official Go namespace.
pub fn is_official(module_path: &str) -> bool {
    OFFICIAL_PREFIXES
        .iter()
        .any(|prefix| module_path.starts_with(prefix))
}

/// Decides which dependencies are skipped.
#[derive(Debug, Clone, Default)]
pub struct DependencyFilter {
    /// Scan official namespaces too
    pub include_official: bool,
    /// Module paths, or substrings of them, to skip
    pub skip: Vec<String>,
}

impl DependencyFilter {
    pub fn new(include_official: bool, skip: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            include_official,
            skip: skip
                .into_iter()
                .map(Into::into)
                .map(|s: String| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Returns the first skip pattern contained in `module_path` (an exact
    /// match included).
    pub fn skip_match(&self, module_path: &str) -> Option<&str> {
        self.skip
            .iter()
            .find(|p| module_path.contains(p.as_str()))
            .map(String::as_str)
    }

    /// Checks a `require` entry.
    pub fn exclude_requirement(&self, req: &ModuleReference) -> Option<ExclusionReason> {
        if !self.include_official && is_official(&req.path) {
            return Some(ExclusionReason::Official);
        }
        self.skip_match(&req.path)
            .map(|p| ExclusionReason::UserSkip(p.to_string()))
    }

    /// Checks a `replace` directive against both its old and new path.
    ///
    /// The official-namespace rule does not apply to replacements.
    pub fn exclude_replacement(&self, rep: &ReplaceDirective) -> Option<ExclusionReason> {
        self.skip_match(&rep.old_path)
            .or_else(|| self.skip_match(&rep.new_path))
            .map(|p| ExclusionReason::UserSkip(p.to_string()))
    }
}
