//! Best-effort pattern scan over a dependency's Go sources.
//!
//! Traversal is depth-first and pre-order, with early pruning through
//! `WalkDir::filter_entry`, so excluded subtrees are never read:
//! - directories whose name starts with `.`, plus `testdata/` and `vendor/`
//! - anything that is not a regular `*.go` file
//! - `*_test.go` files, unless tests are included
//!
//! Entries that cannot be opened are skipped and counted; only an unopenable
//! root fails the scan.
//!
//! ## Matching policy
//!
//! Patterns are literal substrings tried in list order. The first pattern found
//! on a line wins and the rest are not tried, so a line yields at most one
//! [`LineMatch`].

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{DepcmdError, DepcmdResult};

/// Patterns searched for when none are configured.
pub const DEFAULT_PATTERNS: &[&str] = &[".Command(", ".RunCommand(", ".Cmd("];

/// Suffix of scanned source files.
pub const SOURCE_SUFFIX: &str = ".go";

/// Suffix of test sources, excluded unless tests are included.
pub const TEST_SUFFIX: &str = "_test.go";

/// Directory names pruned at any depth (besides dot-directories).
const EXCLUDED_DIRS: &[&str] = &["testdata", "vendor"];

/// A matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineMatch {
    /// 1-indexed
    pub line_number: usize,
    /// Line text with trailing whitespace removed; indentation kept
    pub content: String,
    /// The pattern that matched
    pub pattern: String,
}

/// All matching lines of one file, in file order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMatch {
    pub file_path: PathBuf,
    pub lines: Vec<LineMatch>,
}

/// Outcome of scanning one tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub matches: Vec<FileMatch>,
    /// Directories and files that could not be opened
    pub skipped: usize,
}

impl ScanResult {
    /// Number of matching lines across all files.
    pub fn occurrences(&self) -> usize {
        self.matches.iter().map(|m| m.lines.len()).sum()
    }
}

/// Scanner settings. The pattern list is explicit so scans stay independent.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub patterns: Vec<String>,
    /// Scan `*_test.go` files too
    pub include_tests: bool,
    /// Visit directory entries sorted by name for reproducible output
    pub ordered: bool,
    /// Read files concurrently
    pub parallel: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            include_tests: false,
            ordered: true,
            parallel: true,
        }
    }
}

impl ScanOptions {
    /// Default settings with a custom pattern list.
    pub fn with_patterns(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Files selected for scanning.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    pub files: Vec<PathBuf>,
    pub skipped: usize,
}

/// Checks if a directory entry should be pruned. The root is never pruned.
///
/// Names are compared as raw bytes, so non-UTF-8 names are pruned too.
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().as_encoded_bytes();
    name.starts_with(b".") || EXCLUDED_DIRS.iter().any(|d| d.as_bytes() == name)
}

/// Returns true for `*.go` names, excluding `*_test.go` unless `include_tests`.
pub fn is_source_file(name: impl AsRef<OsStr>, include_tests: bool) -> bool {
    let name = name.as_ref().as_encoded_bytes();
    name.ends_with(SOURCE_SUFFIX.as_bytes())
        && (include_tests || !name.ends_with(TEST_SUFFIX.as_bytes()))
}

/// Returns the first pattern, in list order, contained in `line`.
pub fn match_line<'p>(line: &str, patterns: &'p [String]) -> Option<&'p str> {
    patterns
        .iter()
        .find(|p| line.contains(p.as_str()))
        .map(String::as_str)
}

/// Walks `root` and returns the eligible source files in traversal order.
pub fn collect_source_files(root: &Path, options: &ScanOptions) -> DepcmdResult<Candidates> {
    let meta = fs::metadata(root).map_err(|e| DepcmdError::traversal(root, &e))?;
    if meta.is_dir() {
        fs::read_dir(root).map_err(|e| DepcmdError::traversal(root, &e))?;
    }

    let mut walker = WalkDir::new(root);
    if options.ordered {
        walker = walker.sort_by_file_name();
    }

    let mut candidates = Candidates::default();
    for entry in walker.into_iter().filter_entry(|e| !is_excluded_dir(e)) {
        match entry {
            Ok(e) => {
                if e.file_type().is_file() && is_source_file(e.file_name(), options.include_tests) {
                    candidates.files.push(e.into_path());
                }
            }
            Err(e) if e.depth() == 0 => {
                let path = e.path().unwrap_or(root).to_path_buf();
                let io = e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
                return Err(DepcmdError::traversal(path, &io));
            }
            Err(e) => {
                debug!(path = ?e.path(), error = %e, "skipping unreadable entry");
                candidates.skipped += 1;
            }
        }
    }

    Ok(candidates)
}

/// Scans one file line by line. The handle is dropped before returning.
pub fn scan_file(path: &Path, patterns: &[String]) -> io::Result<Vec<LineMatch>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    let mut line_number = 0;
    let mut lines = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches('\n').trim_end_matches('\r');
        if let Some(pattern) = match_line(line, patterns) {
            lines.push(LineMatch {
                line_number,
                content: line.trim_end_matches([' ', '\t', '\r', '\n']).to_string(),
                pattern: pattern.to_string(),
            });
        }
    }

    Ok(lines)
}

/// Scans pre-collected files. Unreadable files are counted in `skipped`.
pub fn scan_files(files: &[PathBuf], options: &ScanOptions) -> ScanResult {
    let scan_one = |path: &PathBuf| -> io::Result<Option<FileMatch>> {
        let lines = scan_file(path, &options.patterns)?;
        Ok((!lines.is_empty()).then(|| FileMatch {
            file_path: path.clone(),
            lines,
        }))
    };

    let outcomes: Vec<_> = if options.parallel {
        files.par_iter().map(scan_one).collect()
    } else {
        files.iter().map(scan_one).collect()
    };

    let mut result = ScanResult::default();
    for (path, outcome) in files.iter().zip(outcomes) {
        match outcome {
            Ok(Some(file_match)) => result.matches.push(file_match),
            Ok(None) => {}
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable file");
                result.skipped += 1;
            }
        }
    }
    result
}

/// Scans every eligible file under `root`.
///
/// Fails only when `root` itself cannot be opened.
pub fn scan_tree(root: &Path, options: &ScanOptions) -> DepcmdResult<ScanResult> {
    let candidates = collect_source_files(root, options)?;
    let mut result = scan_files(&candidates.files, options);
    result.skipped += candidates.skipped;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join("depcmd_scan_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_file(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_scan_file_reports_matching_lines_in_order() {
        let dir = create_temp_dir("lines");
        let file = dir.join("main.go");
        write_file(&file, "x.Command(\"a\")\n// x.Cmd(b)\nplain text\n");

        let lines = scan_file(&file, &patterns(&[".Command(", ".Cmd("])).unwrap();

        assert_eq!(
            lines,
            vec![
                LineMatch {
                    line_number: 1,
                    content: "x.Command(\"a\")".into(),
                    pattern: ".Command(".into(),
                },
                LineMatch {
                    line_number: 2,
                    content: "// x.Cmd(b)".into(),
                    pattern: ".Cmd(".into(),
                },
            ]
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_first_pattern_in_list_wins() {
        let line = "c := exec.Cmd(x); c.RunCommand(y)";
        assert_eq!(
            match_line(line, &patterns(&[".RunCommand(", ".Cmd("])),
            Some(".RunCommand(")
        );
        assert_eq!(
            match_line(line, &patterns(&[".Cmd(", ".RunCommand("])),
            Some(".Cmd(")
        );
        assert_eq!(match_line("nothing here", &patterns(&[".Cmd("])), None);
    }

    #[test]
    fn test_content_keeps_indentation_and_strips_trailing_whitespace() {
        let dir = create_temp_dir("trim");
        let file = dir.join("a.go");
        write_file(&file, "\tcmd := exec.Command(\"ls\")  \t\r\n");

        let lines = scan_file(&file, &patterns(DEFAULT_PATTERNS)).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].content, "\tcmd := exec.Command(\"ls\")");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_last_line_without_newline_is_scanned() {
        let dir = create_temp_dir("eof");
        let file = dir.join("a.go");
        write_file(&file, "package a\nexec.Command(\"x\")");

        let lines = scan_file(&file, &patterns(DEFAULT_PATTERNS)).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_number, 2);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_utf8_does_not_abort_file() {
        let dir = create_temp_dir("utf8");
        let file = dir.join("a.go");
        fs::write(&file, b"// \xff\xfe junk\nexec.Command(\"x\")\n").unwrap();

        let lines = scan_file(&file, &patterns(DEFAULT_PATTERNS)).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_number, 2);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file("main.go", false));
        assert!(!is_source_file("main_test.go", false));
        assert!(is_source_file("main_test.go", true));
        assert!(!is_source_file("README.md", true));
        assert!(!is_source_file("go.mod", false));
    }

    #[test]
    fn test_excluded_dirs_are_never_scanned() {
        let dir = create_temp_dir("excluded");
        let hit = "exec.Command(\"x\")\n";
        write_file(&dir.join("ok.go"), hit);
        write_file(&dir.join(".git/hooks/a.go"), hit);
        write_file(&dir.join("testdata/b.go"), hit);
        write_file(&dir.join("vendor/c.go"), hit);
        write_file(&dir.join("pkg/.hidden/d.go"), hit);
        write_file(&dir.join("pkg/deep/testdata/e.go"), hit);
        write_file(&dir.join("pkg/deep/vendor/f.go"), hit);
        write_file(&dir.join("pkg/deep/g.go"), hit);

        let result = scan_tree(&dir, &ScanOptions::default()).unwrap();
        let files: Vec<_> = result
            .matches
            .iter()
            .map(|m| m.file_path.strip_prefix(&dir).unwrap().to_path_buf())
            .collect();

        assert_eq!(files, vec![PathBuf::from("ok.go"), PathBuf::from("pkg/deep/g.go")]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_test_files_excluded_by_default() {
        let dir = create_temp_dir("tests");
        write_file(&dir.join("run.go"), "exec.Command(\"a\")\n");
        write_file(&dir.join("run_test.go"), "exec.Command(\"b\")\n");
        write_file(&dir.join("notes.txt"), "exec.Command(\"c\")\n");

        let strict = scan_tree(&dir, &ScanOptions::default()).unwrap();
        assert_eq!(strict.matches.len(), 1);

        let options = ScanOptions {
            include_tests: true,
            ..ScanOptions::default()
        };
        let all = scan_tree(&dir, &options).unwrap();
        assert_eq!(all.matches.len(), 2);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_files_without_matches_produce_no_record() {
        let dir = create_temp_dir("nomatch");
        write_file(&dir.join("a.go"), "package a\n");

        let result = scan_tree(&dir, &ScanOptions::default()).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.occurrences(), 0);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_root_is_traversal_error() {
        let dir = create_temp_dir("missing");
        let err = scan_tree(&dir.join("nope"), &ScanOptions::default()).unwrap_err();
        assert!(matches!(err, DepcmdError::Traversal { .. }));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_dot_named_root_is_still_scanned() {
        let dir = create_temp_dir("dotroot");
        let root = dir.join(".local-replacement");
        write_file(&root.join("a.go"), "exec.Command(\"x\")\n");

        let result = scan_tree(&root, &ScanOptions::default()).unwrap();
        assert_eq!(result.matches.len(), 1);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unreadable_sibling_is_skipped_and_counted() {
        let dir = create_temp_dir("sibling");
        let good = dir.join("good.go");
        write_file(&good, "exec.Command(\"x\")\n");
        let gone = dir.join("gone.go");

        let result = scan_files(&[gone, good.clone()], &ScanOptions::default());

        assert_eq!(result.skipped, 1);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].file_path, good);
        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_pruned_and_scanned() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = create_temp_dir("non_utf8");
        let hit = "exec.Command(\"x\")\n";
        write_file(&dir.join(OsStr::from_bytes(b".hid\xffden")).join("a.go"), hit);
        write_file(&dir.join(OsStr::from_bytes(b"r\xffun.go")), hit);
        write_file(&dir.join(OsStr::from_bytes(b"r\xffun_test.go")), hit);

        let result = scan_tree(&dir, &ScanOptions::default()).unwrap();

        assert_eq!(result.skipped, 0);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(
            result.matches[0].file_path,
            dir.join(OsStr::from_bytes(b"r\xffun.go"))
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped_and_counted() {
        use std::os::unix::fs::PermissionsExt;

        let dir = create_temp_dir("locked");
        let hit = "exec.Command(\"x\")\n";
        write_file(&dir.join("a.go"), hit);
        write_file(&dir.join("locked/b.go"), hit);
        write_file(&dir.join("open/c.go"), hit);
        let locked = dir.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still list the directory
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).ok();
            fs::remove_dir_all(&dir).ok();
            return;
        }

        let result = scan_tree(&dir, &ScanOptions::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).ok();
        let result = result.unwrap();

        assert!(result.skipped >= 1);
        let files: Vec<_> = result
            .matches
            .iter()
            .map(|m| m.file_path.strip_prefix(&dir).unwrap().to_path_buf())
            .collect();
        assert_eq!(files, vec![PathBuf::from("a.go"), PathBuf::from("open/c.go")]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_scan_is_idempotent() {
        let dir = create_temp_dir("idempotent");
        write_file(&dir.join("a.go"), "exec.Command(\"a\")\n");
        write_file(&dir.join("sub/b.go"), "x := 1\nc.RunCommand(y)\n");
        write_file(&dir.join("sub/c.go"), "var c = s.Cmd(z)\n");

        let first = scan_tree(&dir, &ScanOptions::default()).unwrap();
        let second = scan_tree(&dir, &ScanOptions::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.occurrences(), 3);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let dir = create_temp_dir("parallel");
        for i in 0..20 {
            write_file(
                &dir.join(format!("pkg{}/f.go", i)),
                &format!("exec.Command(\"{}\")\n", i),
            );
        }

        let parallel = scan_tree(&dir, &ScanOptions::default()).unwrap();
        let sequential = scan_tree(
            &dir,
            &ScanOptions {
                parallel: false,
                ..ScanOptions::default()
            },
        )
        .unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.matches.len(), 20);
        fs::remove_dir_all(&dir).ok();
    }
}
