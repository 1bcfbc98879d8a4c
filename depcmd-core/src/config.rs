//! Configuration loading from depcmd.toml.

use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{DepcmdError, DepcmdResult, IoResultExt};

/// File name looked up next to the manifest.
pub const CONFIG_FILE_NAME: &str = "depcmd.toml";

/// Main configuration structure for depcmd.toml.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DepcmdConfig {
    /// Literal patterns to search for, replacing the defaults.
    pub patterns: Option<Vec<String>>,
    /// Module paths or substrings to skip.
    pub skip: Option<Vec<String>>,
    /// Scan golang.org / google.golang.org modules too.
    pub include_official: Option<bool>,
    /// Scan `*_test.go` files too.
    pub include_tests: Option<bool>,
    /// Module cache directory, bypassing `go env`.
    pub cache_root: Option<String>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
    /// Colorize plain output.
    pub color: Option<bool>,
}

/// Loads configuration from depcmd.toml in `dir` if it exists.
pub fn load_config(dir: &Path) -> DepcmdResult<Option<DepcmdConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_path(&path)?;
    let cfg: DepcmdConfig =
        toml::from_str(&content).map_err(|e| DepcmdError::config(&path, e.to_string()))?;

    if let Some(format) = cfg.output.as_ref().and_then(|o| o.format.as_deref()) {
        if !matches!(format, "plain" | "json") {
            return Err(DepcmdError::config(
                &path,
                format!("unknown output format {:?} (expected \"plain\" or \"json\")", format),
            ));
        }
    }
    if cfg.patterns.as_ref().is_some_and(|p| p.iter().any(String::is_empty)) {
        return Err(DepcmdError::config(&path, "patterns must not be empty strings"));
    }

    Ok(Some(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join("depcmd_config_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = create_temp_dir("none");
        assert_eq!(load_config(&dir).unwrap(), None);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = create_temp_dir("full");
        fs::write(
            dir.join(CONFIG_FILE_NAME),
            r#"
patterns = [".Command(", "syscall.Exec("]
skip = ["github.com/aws"]
include_official = true
include_tests = false
cache_root = "/opt/gomodcache"

[output]
format = "json"
color = false
"#,
        )
        .unwrap();

        let cfg = load_config(&dir).unwrap().unwrap();
        assert_eq!(
            cfg.patterns,
            Some(vec![".Command(".to_string(), "syscall.Exec(".to_string()])
        );
        assert_eq!(cfg.include_official, Some(true));
        assert_eq!(cfg.cache_root.as_deref(), Some("/opt/gomodcache"));
        let output = cfg.output.unwrap();
        assert_eq!(output.format.as_deref(), Some("json"));
        assert_eq!(output.color, Some(false));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = create_temp_dir("invalid");
        fs::write(dir.join(CONFIG_FILE_NAME), "patterns = 3\n").unwrap();
        let err = load_config(&dir).unwrap_err();
        assert!(matches!(err, DepcmdError::Config { .. }));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_format_is_error() {
        let dir = create_temp_dir("format");
        fs::write(dir.join(CONFIG_FILE_NAME), "[output]\nformat = \"xml\"\n").unwrap();
        assert!(load_config(&dir).is_err());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_pattern_is_error() {
        let dir = create_temp_dir("empty_pattern");
        fs::write(dir.join(CONFIG_FILE_NAME), "patterns = [\"\"]\n").unwrap();
        assert!(load_config(&dir).is_err());
        fs::remove_dir_all(&dir).ok();
    }
}
