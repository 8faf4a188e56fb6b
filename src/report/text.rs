//! Plain text rendering for reports.

use super::Report;

/// Render a human-readable summary of a report.
pub fn to_text(report: &Report) -> String {
    let s = &report.summary;
    let mut lines = vec![
        format!(
            "Ruleset {} | status: {} | {} elements, {} rules, {} ms",
            report.ruleset_version,
            report.status,
            report.elements_checked,
            report.rules_evaluated,
            report.duration_ms
        ),
        format!(
            "Found {} ({} errors, {} warnings): {} fixed, {} overridden, {} fix_failed, {} fix_ineffective",
            s.found, s.errors, s.warnings, s.fixed, s.overridden, s.fix_failed, s.fix_ineffective
        ),
    ];

    if report.by_scope.len() > 1 {
        lines.push(String::new());
        for (scope, summary) in &report.by_scope {
            lines.push(format!(
                "  {:<20} {:>4} found, {:>4} fixed",
                scope, summary.found, summary.fixed
            ));
        }
    }

    if !report.violations.is_empty() {
        lines.push(String::new());
        for v in &report.violations {
            lines.push(format!("{:>4}. {}", v.id, v));
            if let Some(ref detail) = v.detail {
                lines.push(format!("      {}", detail));
            }
        }
    }

    if !report.introduced.is_empty() {
        lines.push(String::new());
        lines.push("Introduced by correction:".to_string());
        lines.extend(report.introduced.iter().map(|v| format!("      {}", v)));
    }

    if !report.recommendations.is_empty() {
        lines.push(String::new());
        lines.push("Recommendations:".to_string());
        lines.extend(report.recommendations.iter().map(|r| format!("  - {}", r)));
    }

    lines.join("\n")
}
