//! Manifest discovery.
//!
//! An explicitly requested manifest is used when it exists. Otherwise the
//! current directory and each of its ancestors are searched for `go.mod`.

use std::path::{Path, PathBuf};

use crate::error::{DepcmdError, DepcmdResult};

/// Name of the Go module manifest.
pub const MANIFEST_NAME: &str = "go.mod";

/// A manifest that was found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedManifest {
    pub path: PathBuf,
    /// True when the requested path was missing and a parent directory supplied it
    pub from_parent: bool,
}

/// Returns the first `go.mod` in `start` or any of its ancestors.
pub fn find_manifest_upwards(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_NAME))
        .find(|candidate| candidate.is_file())
}

/// Resolves the manifest to read.
///
/// `requested` is relative to `cwd` unless absolute.
pub fn locate_manifest(requested: &Path, cwd: &Path) -> DepcmdResult<LocatedManifest> {
    let direct = cwd.join(requested);
    if direct.is_file() {
        return Ok(LocatedManifest {
            path: direct,
            from_parent: false,
        });
    }

    find_manifest_upwards(cwd)
        .map(|path| LocatedManifest {
            path,
            from_parent: true,
        })
        .ok_or_else(|| DepcmdError::ManifestNotFound {
            path: requested.to_path_buf(),
        })
}
