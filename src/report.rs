// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Plain-text reports

use std::fmt::{self, Write};

use crate::policy::{DiscoveryStats, LintWarning};
use crate::validate::PolicyDiff;

/// Differences listed before the rest are summarized
pub const MAX_LISTED_DIFFERENCES: usize = 10;

/// Discovery statistics as a text table
#[derive(Debug, Clone)]
pub struct SummaryReport<'a> {
    stats: &'a DiscoveryStats,
}

impl<'a> SummaryReport<'a> {
    pub fn new(stats: &'a DiscoveryStats) -> Self {
        Self { stats }
    }
}

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CSP Generation Report")?;
        let width = self.stats.iter().map(|(s, _)| s.label().len()).max().unwrap_or(0);
        for (stat, value) in self.stats.iter() {
            writeln!(f, "  {:<width$}  {}", stat.label(), value, width = width)?;
        }
        Ok(())
    }
}

/// Lint warnings, one per line, with a closing count
pub fn render_lint(warnings: &[LintWarning]) -> String {
    let mut out = String::new();
    for warning in warnings {
        let _ = writeln!(out, "Warning: {}", warning);
    }
    if warnings.is_empty() {
        out.push_str("Lint mode: No unsafe sources detected\n");
    } else {
        let _ = writeln!(out, "Lint mode: {} unsafe sources detected", warnings.len());
    }
    out
}

/// Explain a policy mismatch. "Existing" is the stored or site policy.
pub fn render_diff(diff: &PolicyDiff) -> String {
    let mut out = String::from("CSP Mismatch Details\n");

    if diff.is_valid() {
        out.push_str("Sources match; directive or source order differs\n");
        return out;
    }

    for entry in diff.directives.iter().take(MAX_LISTED_DIFFERENCES) {
        let _ = writeln!(out, "Directive: {}", entry.directive);
        let _ = writeln!(out, "  Missing in Existing: {}", join_or_dash(&entry.missing));
        let _ = writeln!(out, "  Extra in Existing: {}", join_or_dash(&entry.extra));
    }
    if diff.directives.len() > MAX_LISTED_DIFFERENCES {
        let _ = writeln!(
            out,
            "... and {} more differences not shown.",
            diff.directives.len() - MAX_LISTED_DIFFERENCES
        );
    }

    if !diff.missing_directives.is_empty() {
        let _ = writeln!(
            out,
            "Directives missing in existing CSP: {}",
            join(&diff.missing_directives)
        );
    }
    if !diff.extra_directives.is_empty() {
        let _ = writeln!(out, "Extra directives in existing CSP: {}", join(&diff.extra_directives));
    }

    out.push_str("\nMismatch Metrics:\n");
    for entry in &diff.directives {
        let counts = entry.counts();
        let _ = writeln!(out, "{}:", entry.directive);
        for (label, n) in [
            ("Missing Hashes", counts.missing_hashes),
            ("Extra Hashes", counts.extra_hashes),
            ("Missing Links", counts.missing_links),
            ("Extra Links", counts.extra_links),
        ] {
            if n > 0 {
                let _ = writeln!(out, "  {}: {}", label, n);
            }
        }
    }

    out
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn join_or_dash<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let joined = join(items);
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}
