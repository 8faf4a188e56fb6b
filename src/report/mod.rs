//! Report building and rendering.
//!
//! A [`Report`] is a pure aggregation of one pass: the violations with
//! their outcomes, counts grouped by outcome, scope and severity, and a
//! status. Every violation found appears exactly once in the summary.

mod json;
mod text;

pub use json::{to_json, JsonFormat};
pub use text::to_text;

use crate::engine::{Outcome, Violation};
use crate::rules::Severity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Scope name used for rules without one.
pub const DEFAULT_SCOPE: &str = "default";

/// Report of a validation or correction pass.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub ruleset_version: String,
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: Status,

    /// Distinct elements selected by at least one rule
    pub elements_checked: usize,
    pub rules_evaluated: usize,

    pub summary: Summary,
    pub by_scope: BTreeMap<String, Summary>,
    pub by_severity: BTreeMap<Severity, Summary>,

    /// Violations of the initial pass, with outcomes after correction
    pub violations: Vec<Violation>,

    /// Violations that only appeared after correction
    pub introduced: Vec<Violation>,

    pub recommendations: Vec<String>,
}

impl Report {
    /// Aggregate a pass into a report.
    pub fn build(
        ruleset_version: impl Into<String>,
        elements_checked: usize,
        rules_evaluated: usize,
        violations: Vec<Violation>,
        introduced: Vec<Violation>,
        duration: Duration,
    ) -> Self {
        let mut summary = Summary::default();
        let mut by_scope: BTreeMap<String, Summary> = BTreeMap::new();
        let mut by_severity: BTreeMap<Severity, Summary> = BTreeMap::new();

        for v in &violations {
            summary.add(v);
            let scope = if v.scope.is_empty() {
                DEFAULT_SCOPE
            } else {
                v.scope.as_str()
            };
            by_scope.entry(scope.to_string()).or_default().add(v);
            by_severity.entry(v.severity).or_default().add(v);
        }

        let status = Status::of(&violations, &introduced);
        let recommendations = recommendations(&summary, status, &violations, &introduced);

        Self {
            ruleset_version: ruleset_version.into(),
            generated_at: Utc::now(),
            duration_ms: duration.as_millis() as u64,
            status,
            elements_checked,
            rules_evaluated,
            summary,
            by_scope,
            by_severity,
            violations,
            introduced,
            recommendations,
        }
    }

    /// Violations with a given outcome.
    pub fn with_outcome(&self, outcome: Outcome) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.outcome == Some(outcome))
    }

    /// Follow-up hints for a human reviewer.
    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    /// Error-severity violations still unresolved after the pass.
    pub fn blocking_errors(&self) -> usize {
        self.violations
            .iter()
            .chain(&self.introduced)
            .filter(|v| {
                v.is_error()
                    && !matches!(v.outcome, Some(Outcome::Fixed) | Some(Outcome::Overridden))
            })
            .count()
    }
}

/// Counts of a set of violations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub found: usize,
    pub fixed: usize,
    pub overridden: usize,
    pub fix_failed: usize,
    pub fix_ineffective: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl Summary {
    /// Count one violation.
    pub fn add(&mut self, v: &Violation) {
        self.found += 1;
        match v.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        match v.outcome {
            Some(Outcome::Fixed) => self.fixed += 1,
            Some(Outcome::Overridden) => self.overridden += 1,
            Some(Outcome::FixFailed) => self.fix_failed += 1,
            Some(Outcome::FixIneffective) => self.fix_ineffective += 1,
            None => {}
        }
    }

    /// Violations with an outcome.
    pub fn resolved(&self) -> usize {
        self.fixed + self.overridden + self.fix_failed + self.fix_ineffective
    }

    /// Every violation has exactly one outcome (or, for a validate-only
    /// pass, none has).
    pub fn reconciles(&self) -> bool {
        let resolved = self.resolved();
        resolved == self.found || resolved == 0
    }
}

/// Overall status of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// No violations
    Clean,
    /// Violations found, no correction attempted
    Validated,
    /// Every error-severity violation was fixed or lost a conflict
    Corrected,
    /// Error-severity violations remain that need a human
    NeedsReview,
}

impl Status {
    fn of(violations: &[Violation], introduced: &[Violation]) -> Self {
        if violations.is_empty() && introduced.is_empty() {
            return Status::Clean;
        }
        if violations.iter().all(|v| v.outcome.is_none()) && introduced.is_empty() {
            return Status::Validated;
        }
        let blocking = violations
            .iter()
            .any(|v| v.is_error() && v.needs_review())
            || introduced.iter().any(|v| v.is_error());
        if blocking {
            Status::NeedsReview
        } else {
            Status::Corrected
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Clean => "clean",
            Status::Validated => "validated",
            Status::Corrected => "corrected",
            Status::NeedsReview => "needs_review",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn rule_list<'a>(violations: impl Iterator<Item = &'a Violation>) -> String {
    let mut ids: Vec<&str> = violations.map(|v| v.rule_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.join(", ")
}

fn recommendations(
    summary: &Summary,
    status: Status,
    violations: &[Violation],
    introduced: &[Violation],
) -> Vec<String> {
    let mut out = Vec::new();

    if status == Status::Validated && summary.errors > 0 {
        out.push(format!(
            "Run correction to fix {} error violation(s) automatically",
            summary.errors
        ));
    }
    if summary.fix_ineffective > 0 {
        out.push(format!(
            "{} fix(es) did not take effect; check that the fix actions of rules {} address their checks",
            summary.fix_ineffective,
            rule_list(violations.iter().filter(|v| v.outcome == Some(Outcome::FixIneffective)))
        ));
    }
    if summary.fix_failed > 0 {
        out.push(format!(
            "{} violation(s) could not be fixed automatically and need manual review (rules {})",
            summary.fix_failed,
            rule_list(violations.iter().filter(|v| v.outcome == Some(Outcome::FixFailed)))
        ));
    }
    if summary.overridden > 0 {
        out.push(format!(
            "{} violation(s) lost a conflict to a higher-priority rule; review priorities of rules {}",
            summary.overridden,
            rule_list(violations.iter().filter(|v| v.outcome == Some(Outcome::Overridden)))
        ));
    }
    if !introduced.is_empty() {
        out.push(format!(
            "Correction introduced {} new violation(s) (rules {}); the ruleset has conflicting rules",
            introduced.len(),
            rule_list(introduced.iter())
        ));
    }
    out
}
