//! Aggregate statistics over a finished run.

use serde::Serialize;

use crate::audit::{AuditReport, DependencyStatus};
use crate::scan::FileMatch;

/// Occurrences of one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCount {
    pub pattern: String,
    pub count: usize,
}

/// Totals computed from an [`AuditReport`] without modifying it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_occurrences: usize,
    pub files_matched: usize,
    /// In configured pattern order; patterns with no hits are listed with 0
    pub pattern_counts: Vec<PatternCount>,
    pub scanned: usize,
    pub missing: usize,
    pub excluded: usize,
    pub failed: usize,
    /// Entries that could not be opened while scanning
    pub skipped_entries: usize,
}

impl Summary {
    pub fn from_report(report: &AuditReport) -> Self {
        let mut summary = Self::from_matches(&report.matches, &report.patterns);

        for outcome in &report.outcomes {
            match &outcome.status {
                DependencyStatus::Scanned { skipped, .. } => {
                    summary.scanned += 1;
                    summary.skipped_entries += skipped;
                }
                DependencyStatus::Missing => summary.missing += 1,
                DependencyStatus::Excluded { .. } => summary.excluded += 1,
                DependencyStatus::ScanFailed { .. } => summary.failed += 1,
            }
        }

        summary
    }

    /// Match totals only; dependency counters stay at zero.
    pub fn from_matches(matches: &[FileMatch], patterns: &[String]) -> Self {
        let mut pattern_counts: Vec<PatternCount> = patterns
            .iter()
            .map(|p| PatternCount {
                pattern: p.clone(),
                count: 0,
            })
            .collect();

        for line in matches.iter().flat_map(|m| &m.lines) {
            match pattern_counts.iter_mut().find(|c| c.pattern == line.pattern) {
                Some(entry) => entry.count += 1,
                None => pattern_counts.push(PatternCount {
                    pattern: line.pattern.clone(),
                    count: 1,
                }),
            }
        }

        Self {
            total_occurrences: matches.iter().map(|m| m.lines.len()).sum(),
            files_matched: matches.len(),
            pattern_counts,
            ..Self::default()
        }
    }

    pub fn has_matches(&self) -> bool {
        self.total_occurrences > 0
    }
}
