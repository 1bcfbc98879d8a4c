//! Discovery of the Go module cache root.
//!
//! The cache root is `go env GOMODCACHE`. Older toolchains do not know that
//! variable, in which case the root is `$(go env GOPATH)/pkg/mod`.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::{DepcmdError, DepcmdResult};

/// Subpath of the first GOPATH entry that holds the module cache.
const GOPATH_CACHE_SUBDIR: [&str; 2] = ["pkg", "mod"];

/// Source of Go environment values.
pub trait GoEnv {
    /// Returns the trimmed value of `key`, or `None` if it is unavailable or empty.
    fn get(&self, key: &str) -> Option<String>;
}

/// Queries the installed toolchain with `go env KEY`.
#[derive(Debug, Clone)]
pub struct GoToolEnv {
    program: String,
}

impl GoToolEnv {
    pub fn new() -> Self {
        Self {
            program: "go".to_string(),
        }
    }

    /// Use a specific `go` binary instead of the one on `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GoToolEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl GoEnv for GoToolEnv {
    fn get(&self, key: &str) -> Option<String> {
        let output = Command::new(&self.program).args(["env", key]).output().ok()?;

        if !output.status.success() {
            debug!(key, status = %output.status, "go env failed");
            return None;
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!value.is_empty()).then_some(value)
    }
}

/// Determines the module cache root from `env`.
///
/// GOPATH may be a list; only its first entry is used.
pub fn discover_cache_root(env: &impl GoEnv) -> DepcmdResult<PathBuf> {
    if let Some(cache) = env.get("GOMODCACHE") {
        return Ok(PathBuf::from(cache));
    }

    let gopath = env
        .get("GOPATH")
        .ok_or_else(|| DepcmdError::cache_root("neither GOMODCACHE nor GOPATH is available"))?;

    let first = std::env::split_paths(&gopath)
        .find(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| DepcmdError::cache_root(format!("GOPATH {:?} has no entries", gopath)))?;

    Ok(GOPATH_CACHE_SUBDIR
        .iter()
        .fold(first, |path, segment| path.join(segment)))
}
