//! Output formatting - plaintext and JSON.

use std::io::{self, Write};

use colored::Colorize;
use serde_json::json;

use crate::audit::{AuditReport, DependencyStatus};
use crate::scan::TEST_SUFFIX;
use crate::summary::Summary;

/// Writes the human-readable report.
///
/// Matched lines are highlighted; call `colored::control::set_override(false)`
/// beforehand to get plain text.
pub fn write_plain<W: Write>(out: &mut W, report: &AuditReport, summary: &Summary) -> io::Result<()> {
    writeln!(out, "Module: {}", report.module)?;
    writeln!(
        out,
        "Go version: {}",
        report.go_version.as_deref().unwrap_or("(unspecified)")
    )?;
    writeln!(out, "Module cache location: {}", report.cache_root.display())?;
    writeln!(out, "Searching for command patterns: {}", report.patterns.join(", "))?;
    if report.include_tests {
        writeln!(out, "Including test files (*{})", TEST_SUFFIX)?;
    } else {
        writeln!(out, "Skipping test files (*{})", TEST_SUFFIX)?;
    }
    if report.include_official {
        writeln!(out, "Including official Go packages (*.golang.org/*)")?;
    } else {
        writeln!(out, "Skipping official Go packages (*.golang.org/*)")?;
    }
    if !report.skip.is_empty() {
        writeln!(out, "Skipping user-specified packages: {}", report.skip.join(", "))?;
    }
    writeln!(out)?;

    for outcome in &report.outcomes {
        let path = outcome
            .location
            .as_ref()
            .map(|l| l.path.display().to_string())
            .unwrap_or_default();
        match &outcome.status {
            DependencyStatus::Missing => {
                writeln!(out, "- {}", outcome.dependency.label())?;
                writeln!(out, "  Location not found ({})", path)?;
                writeln!(out)?;
            }
            DependencyStatus::ScanFailed { message } => {
                writeln!(out, "- {}", outcome.dependency.label())?;
                writeln!(out, "  Error scanning: {}", message)?;
                writeln!(out)?;
            }
            DependencyStatus::Scanned { .. } | DependencyStatus::Excluded { .. } => {}
        }
    }

    writeln!(out, "Results:")?;
    writeln!(out)?;

    if !summary.has_matches() {
        writeln!(out, "No command patterns found in any files.")?;
        writeln!(out)?;
    } else {
        writeln!(
            out,
            "Found {} command pattern occurrences in {} files:",
            summary.total_occurrences, summary.files_matched
        )?;
        writeln!(out)?;
        for count in summary.pattern_counts.iter().filter(|c| c.count > 0) {
            writeln!(out, "  {}: {}", count.pattern, count.count)?;
        }
        writeln!(out)?;

        for file_match in &report.matches {
            for line in &file_match.lines {
                writeln!(out, "{}:{}", file_match.file_path.display(), line.line_number)?;
                writeln!(out, "{}", line.content.trim().bright_yellow())?;
            }
            writeln!(out)?;
        }
    }

    if summary.skipped_entries > 0 {
        writeln!(
            out,
            "Skipped {} unreadable entries (set RUST_LOG=depcmd_core=debug for details)",
            summary.skipped_entries
        )?;
    }

    Ok(())
}

/// Prints the human-readable report to stdout.
pub fn print_plain(report: &AuditReport, summary: &Summary) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_plain(&mut out, report, summary)
}

/// Renders the report and its summary as pretty JSON.
pub fn render_json(report: &AuditReport, summary: &Summary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "report": report,
        "summary": summary,
    }))
}

/// Prints the report in JSON format.
///
/// Falls back to the summary alone if the report cannot be serialized.
pub fn print_json(report: &AuditReport, summary: &Summary) {
    match render_json(report, summary) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!(
                "{{\"summary\": {{\"total_occurrences\": {}, \"files_matched\": {}}}}}",
                summary.total_occurrences, summary.files_matched
            );
        }
    }
}
