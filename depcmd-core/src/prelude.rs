//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use depcmd_core::prelude::*;
//! ```

// Errors
pub use crate::error::{DepcmdError, DepcmdResult};

// Manifest
pub use crate::locate::locate_manifest;
pub use crate::modfile::{ModFile, ModuleReference, ReplaceDirective};

// Resolution
pub use crate::resolve::{resolve, ResolvedLocation};

// Scanning
pub use crate::scan::{scan_tree, FileMatch, LineMatch, ScanOptions, ScanResult};

// Builder API
pub use crate::audit::{Audit, AuditReport};
pub use crate::summary::Summary;

// Configuration
pub use crate::config::{load_config, DepcmdConfig};
