//! Typed error handling for depcmd.
//!
//! Setup failures (manifest, cache root, config) are fatal and end the run.
//! Everything that happens while resolving or scanning a single dependency is
//! recoverable: it becomes an outcome in the report instead of an error.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for depcmd operations.
#[derive(Error, Debug)]
pub enum DepcmdError {
    /// I/O error when reading files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The module manifest could not be located
    #[error("go.mod file not found at {path} or in any parent directory")]
    ManifestNotFound { path: PathBuf },

    /// Syntax error in the module manifest
    #[error("Parse error in {path}:{line}: {message}")]
    Manifest {
        path: PathBuf,
        /// Line number (1-indexed)
        line: usize,
        message: String,
    },

    /// Neither GOMODCACHE nor GOPATH could be obtained
    #[error("Failed to get module cache path: {message}")]
    CacheRoot { message: String },

    /// The root of a scan could not be opened
    #[error("Cannot open {path}: {message}")]
    Traversal { path: PathBuf, message: String },

    /// A module path could not be escaped for the cache layout
    #[error("Invalid module path {path:?}: {message}")]
    Encoding { path: String, message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl DepcmdError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a manifest parse error at a line.
    pub fn manifest(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a cache root discovery error.
    pub fn cache_root(message: impl Into<String>) -> Self {
        Self::CacheRoot {
            message: message.into(),
        }
    }

    /// Create a traversal error for an unopenable scan root.
    pub fn traversal(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Traversal {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create an encoding error.
    pub fn encoding(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encoding {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if this error must abort the run before any dependency is scanned.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::ManifestNotFound { .. }
                | Self::Manifest { .. }
                | Self::CacheRoot { .. }
                | Self::Config { .. }
                | Self::InvalidArgument { .. }
        )
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::ManifestNotFound { path } => Some(path),
            Self::Manifest { path, .. } => Some(path),
            Self::Traversal { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for depcmd results.
pub type DepcmdResult<T> = Result<T, DepcmdError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> DepcmdResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> DepcmdResult<T> {
        self.map_err(|e| DepcmdError::io(path, e))
    }
}
