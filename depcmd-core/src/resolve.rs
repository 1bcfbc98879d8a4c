//! Maps module references to their install directories in the module cache.
//!
//! The cache stores every module version under `<root>/<escaped-path>@<version>`.
//! The escaped form keeps paths unique on case-insensitive filesystems:
//!
//! - every uppercase letter `X` becomes `!x`
//! - a literal `!` becomes `!!`
//!
//! so `github.com/BurntSushi/toml` lives in `github.com/!burnt!sushi/toml@v1.3.2`.
//! Versions never carry `+incompatible` on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::error::{DepcmdError, DepcmdResult};
use crate::modfile::{ModuleReference, ReplaceDirective};

/// Version suffix for pre-modules major versions; absent from cache directory names.
pub const INCOMPATIBLE_SUFFIX: &str = "+incompatible";

/// Where a dependency is expected on disk and whether it is there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLocation {
    pub path: PathBuf,
    pub exists: bool,
    /// True for filesystem replacements (`=> ../local`), which bypass the cache.
    pub is_local: bool,
}

/// Escapes a module path into its case-insensitive-safe cache form.
///
/// Fails on empty paths and on characters that never appear in valid module
/// paths (non-ASCII, whitespace, control characters).
pub fn escape_path(module_path: &str) -> DepcmdResult<String> {
    if module_path.is_empty() {
        return Err(DepcmdError::encoding(module_path, "empty module path"));
    }

    let mut out = String::with_capacity(module_path.len() + 4);
    for c in module_path.chars() {
        match c {
            '!' => out.push_str("!!"),
            'A'..='Z' => {
                out.push('!');
                out.push(c.to_ascii_lowercase());
            }
            c if !c.is_ascii() => {
                return Err(DepcmdError::encoding(
                    module_path,
                    format!("non-ASCII character {:?}", c),
                ));
            }
            c if c.is_ascii_whitespace() || c.is_ascii_control() => {
                return Err(DepcmdError::encoding(
                    module_path,
                    format!("invalid character {:?}", c),
                ));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Inverse of [`escape_path`].
pub fn unescape_path(escaped: &str) -> DepcmdResult<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        match c {
            '!' => match chars.next() {
                Some('!') => out.push('!'),
                Some(n @ 'a'..='z') => out.push(n.to_ascii_uppercase()),
                Some(n) => {
                    return Err(DepcmdError::encoding(
                        escaped,
                        format!("invalid escape sequence !{}", n),
                    ));
                }
                None => return Err(DepcmdError::encoding(escaped, "trailing '!'")),
            },
            'A'..='Z' => {
                return Err(DepcmdError::encoding(
                    escaped,
                    format!("unescaped uppercase character {:?}", c),
                ));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Removes a single trailing `+incompatible` from a version.
pub fn clean_version(version: &str) -> &str {
    version.strip_suffix(INCOMPATIBLE_SUFFIX).unwrap_or(version)
}

/// Computes the install directory of `module_path@version` under `cache_root`.
///
/// If the path cannot be escaped, the raw path is used and a warning is logged.
pub fn resolve(module_path: &str, version: &str, cache_root: &Path) -> PathBuf {
    let encoded = match escape_path(module_path) {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!(module = %module_path, error = %e, "could not encode module path, using it verbatim");
            module_path.to_string()
        }
    };

    cache_root.join(format!("{}@{}", encoded, clean_version(version)))
}

/// Returns true if anything exists at `path`. Every stat error reads as "absent".
pub fn path_exists(path: &Path) -> bool {
    fs::metadata(path).is_ok()
}

/// Resolves a `require` entry against the module cache.
pub fn resolve_requirement(req: &ModuleReference, cache_root: &Path) -> ResolvedLocation {
    let path = resolve(&req.path, &req.version, cache_root);
    ResolvedLocation {
        exists: path_exists(&path),
        path,
        is_local: false,
    }
}

/// Resolves the target of a `replace` directive.
///
/// A replacement without a version names a local directory and is returned
/// as written; the cache root is not consulted.
pub fn resolve_replacement(rep: &ReplaceDirective, cache_root: &Path) -> ResolvedLocation {
    if rep.is_local() {
        let path = PathBuf::from(&rep.new_path);
        return ResolvedLocation {
            exists: path_exists(&path),
            path,
            is_local: true,
        };
    }

    let path = resolve(&rep.new_path, &rep.new_version, cache_root);
    ResolvedLocation {
        exists: path_exists(&path),
        path,
        is_local: false,
    }
}
