//! Parsing of `go.mod` manifests.
//!
//! Only what dependency resolution needs is retained: the module path, the
//! `go` version, every `require` entry and every `replace` directive. Other
//! directives (`exclude`, `retract`, `toolchain`, ...) are accepted and dropped.
//!
//! Both directive forms are supported:
//!
//! ```text
//! require github.com/a/b v1.2.3
//! require (
//!     github.com/c/d v0.1.0 // indirect
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{DepcmdError, DepcmdResult, IoResultExt};

/// A `require` entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleReference {
    pub path: String,
    pub version: String,
    /// Marked `// indirect` in the manifest
    pub indirect: bool,
}

/// A `replace old [v] => new [v]` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaceDirective {
    pub old_path: String,
    /// Empty when the replacement applies to every version of `old_path`
    pub old_version: String,
    pub new_path: String,
    /// Empty when `new_path` is a filesystem directory
    pub new_version: String,
}

impl ReplaceDirective {
    /// True when the replacement points at a local directory.
    pub fn is_local(&self) -> bool {
        self.new_version.is_empty()
    }
}

/// Parsed manifest.
#[derive(Debug, Clone, Serialize)]
pub struct ModFile {
    /// File the manifest was read from
    pub source: PathBuf,
    pub module: String,
    pub go_version: Option<String>,
    pub require: Vec<ModuleReference>,
    pub replace: Vec<ReplaceDirective>,
}

/// Directives that are valid in a manifest but irrelevant here.
const IGNORED_DIRECTIVES: &[&str] = &["exclude", "retract", "toolchain", "godebug", "tool", "ignore"];

/// One logical line: its tokens and the trailing comment, if any.
struct Line<'a> {
    number: usize,
    tokens: Vec<String>,
    comment: Option<&'a str>,
}

impl ModFile {
    /// Reads and parses the manifest at `path`.
    pub fn load(path: &Path) -> DepcmdResult<Self> {
        let text = fs::read_to_string(path).with_path(path)?;
        Self::parse(path, &text)
    }

    /// Parses manifest text. `path` is only used for error messages.
    pub fn parse(path: &Path, text: &str) -> DepcmdResult<Self> {
        let mut module: Option<String> = None;
        let mut go_version = None;
        let mut require = Vec::new();
        let mut replace = Vec::new();

        // Verb of the currently open `verb ( ... )` block.
        let mut block: Option<(String, usize)> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = tokenize(path, idx + 1, raw)?;
            if line.tokens.is_empty() {
                continue;
            }

            let open_verb = block.as_ref().map(|(verb, _)| verb.clone());
            let (verb, args): (String, &[String]) = match open_verb {
                Some(verb) => {
                    if line.tokens.len() == 1 && line.tokens[0] == ")" {
                        block = None;
                        continue;
                    }
                    (verb, &line.tokens[..])
                }
                None => {
                    let verb = line.tokens[0].clone();
                    let rest = &line.tokens[1..];
                    if rest.first().is_some_and(|t| t == "(") {
                        match rest.len() {
                            1 => {
                                block = Some((verb, line.number));
                                continue;
                            }
                            2 if rest[1] == ")" => continue,
                            _ => {
                                return Err(DepcmdError::manifest(
                                    path,
                                    line.number,
                                    "unexpected tokens after '('",
                                ));
                            }
                        }
                    }
                    (verb, rest)
                }
            };

            match verb.as_str() {
                "module" => {
                    if block.is_some() || args.len() != 1 {
                        return Err(DepcmdError::manifest(path, line.number, "usage: module module/path"));
                    }
                    if module.is_some() {
                        return Err(DepcmdError::manifest(path, line.number, "repeated module statement"));
                    }
                    module = Some(args[0].clone());
                }
                "go" => {
                    if block.is_some() || args.len() != 1 {
                        return Err(DepcmdError::manifest(path, line.number, "usage: go 1.23"));
                    }
                    go_version = Some(args[0].clone());
                }
                "require" => require.push(parse_require(path, &line, args)?),
                "replace" => replace.push(parse_replace(path, line.number, args)?),
                v if IGNORED_DIRECTIVES.contains(&v) => {}
                other => {
                    return Err(DepcmdError::manifest(
                        path,
                        line.number,
                        format!("unknown directive: {}", other),
                    ));
                }
            }
        }

        if let Some((verb, opened)) = block {
            return Err(DepcmdError::manifest(
                path,
                opened,
                format!("unterminated {} block", verb),
            ));
        }

        let module = module.ok_or_else(|| DepcmdError::manifest(path, 1, "no module directive"))?;

        Ok(Self {
            source: path.to_path_buf(),
            module,
            go_version,
            require,
            replace,
        })
    }
}

fn parse_require(path: &Path, line: &Line<'_>, args: &[String]) -> DepcmdResult<ModuleReference> {
    if args.len() != 2 {
        return Err(DepcmdError::manifest(
            path,
            line.number,
            "usage: require module/path v1.2.3",
        ));
    }
    Ok(ModuleReference {
        path: args[0].clone(),
        version: args[1].clone(),
        indirect: line.comment.is_some_and(is_indirect_comment),
    })
}

fn parse_replace(path: &Path, number: usize, args: &[String]) -> DepcmdResult<ReplaceDirective> {
    let usage = || {
        DepcmdError::manifest(
            path,
            number,
            "usage: replace module/path [v1.2.3] => other/module v1.4 | replace module/path [v1.2.3] => ../local/directory",
        )
    };

    let arrow = args.iter().position(|t| t == "=>").ok_or_else(usage)?;
    let (old, new) = (&args[..arrow], &args[arrow + 1..]);

    let (old_path, old_version) = match old {
        [p] => (p.clone(), String::new()),
        [p, v] => (p.clone(), v.clone()),
        _ => return Err(usage()),
    };
    let (new_path, new_version) = match new {
        [p] => (p.clone(), String::new()),
        [p, v] => (p.clone(), v.clone()),
        _ => return Err(usage()),
    };

    Ok(ReplaceDirective {
        old_path,
        old_version,
        new_path,
        new_version,
    })
}

/// `// indirect` or `// indirect; other notes`.
fn is_indirect_comment(comment: &str) -> bool {
    let c = comment.trim();
    c == "indirect" || c.starts_with("indirect;")
}

/// Splits a line into tokens, honoring `"..."` and `` `...` `` quoting and
/// stopping at a `//` comment.
fn tokenize<'a>(path: &Path, number: usize, raw: &'a str) -> DepcmdResult<Line<'a>> {
    let mut tokens = Vec::new();
    let mut comment = None;
    let mut chars = raw.char_indices().peekable();

    while let Some(&(i, c)) = chars.peek() {
        let rest = &raw[i..];
        if c.is_whitespace() {
            chars.next();
        } else if rest.starts_with("//") {
            comment = Some(&rest[2..]);
            break;
        } else if rest.starts_with("=>") {
            tokens.push("=>".to_string());
            chars.next();
            chars.next();
        } else if c == '(' || c == ')' {
            tokens.push(c.to_string());
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some((_, q)) = chars.next() {
                match q {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    q => value.push(q),
                }
            }
            if !closed {
                return Err(DepcmdError::manifest(path, number, "unterminated quoted string"));
            }
            tokens.push(value);
        } else if c == '`' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            for (_, q) in chars.by_ref() {
                if q == '`' {
                    closed = true;
                    break;
                }
                value.push(q);
            }
            if !closed {
                return Err(DepcmdError::manifest(path, number, "unterminated raw string"));
            }
            tokens.push(value);
        } else {
            let mut value = String::new();
            while let Some(&(j, t)) = chars.peek() {
                let tail = &raw[j..];
                if t.is_whitespace()
                    || matches!(t, '(' | ')' | '"' | '`')
                    || tail.starts_with("//")
                    || tail.starts_with("=>")
                {
                    break;
                }
                value.push(t);
                chars.next();
            }
            tokens.push(value);
        }
    }

    Ok(Line {
        number,
        tokens,
        comment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> DepcmdResult<ModFile> {
        ModFile::parse(Path::new("go.mod"), text)
    }

    #[test]
    fn test_parse_basic_manifest() {
        let mf = parse(
            "module example.com/app\n\ngo 1.21\n\nrequire example.com/Foo/Bar v1.2.3\n",
        )
        .unwrap();
        assert_eq!(mf.module, "example.com/app");
        assert_eq!(mf.go_version.as_deref(), Some("1.21"));
        assert_eq!(
            mf.require,
            vec![ModuleReference {
                path: "example.com/Foo/Bar".into(),
                version: "v1.2.3".into(),
                indirect: false,
            }]
        );
    }

    #[test]
    fn test_parse_require_block_with_indirect() {
        let mf = parse(
            r#"module example.com/app

require (
	github.com/fatih/color v1.16.0
	github.com/mattn/go-isatty v0.0.20 // indirect
	golang.org/x/sys v0.14.0 // indirect; pulled in by isatty
	github.com/pkg/errors v0.9.1 // keep this pinned
)
"#,
        )
        .unwrap();
        let flags: Vec<_> = mf.require.iter().map(|r| r.indirect).collect();
        assert_eq!(flags, vec![false, true, true, false]);
        assert_eq!(mf.require[1].path, "github.com/mattn/go-isatty");
    }

    #[test]
    fn test_parse_replace_forms() {
        let mf = parse(
            r#"module example.com/app

replace example.com/old => ../old
replace (
	example.com/pinned v1.0.0 => example.com/fork v1.0.1
	"example.com/quoted" => `./vendor/quoted`
)
"#,
        )
        .unwrap();
        assert_eq!(mf.replace.len(), 3);
        assert!(mf.replace[0].is_local());
        assert_eq!(mf.replace[0].new_path, "../old");
        assert_eq!(mf.replace[1].old_version, "v1.0.0");
        assert_eq!(mf.replace[1].new_version, "v1.0.1");
        assert!(!mf.replace[1].is_local());
        assert_eq!(mf.replace[2].old_path, "example.com/quoted");
        assert_eq!(mf.replace[2].new_path, "./vendor/quoted");
    }

    #[test]
    fn test_ignored_directives() {
        let mf = parse(
            "module m\ntoolchain go1.22.1\nexclude (\n\texample.com/bad v1.0.0\n)\nretract v0.1.0\n",
        )
        .unwrap();
        assert!(mf.require.is_empty());
        assert!(mf.replace.is_empty());
    }

    #[test]
    fn test_empty_inline_block() {
        let mf = parse("module m\nrequire ()\n").unwrap();
        assert!(mf.require.is_empty());
    }

    #[test]
    fn test_missing_module_is_error() {
        let err = parse("go 1.21\n").unwrap_err();
        assert!(matches!(err, DepcmdError::Manifest { .. }));
    }

    #[test]
    fn test_malformed_require_reports_line() {
        let err = parse("module m\n\nrequire example.com/only-path\n").unwrap_err();
        match err {
            DepcmdError::Manifest { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unterminated_block_is_error() {
        let err = parse("module m\nrequire (\n\texample.com/a v1.0.0\n").unwrap_err();
        match err {
            DepcmdError::Manifest { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("unterminated"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_directive_is_error() {
        assert!(parse("module m\nfrobnicate x\n").is_err());
    }

    #[test]
    fn test_replace_without_arrow_is_error() {
        assert!(parse("module m\nreplace a v1 b v2\n").is_err());
    }
}
