//! Violations and their correction outcomes.

use crate::model::ElementPath;
use crate::rules::{Property, Rule, Severity, Value};
use serde::Serialize;
use std::fmt;

/// A failed check on one element, tracked through correction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// 1-based sequence number within its pass
    pub id: usize,

    /// Rule that produced the violation
    pub rule_id: String,

    /// Scope of that rule
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scope: String,

    /// Index of the failing check within the rule
    pub check_index: usize,

    /// Offending element
    #[serde(rename = "element_path")]
    pub path: ElementPath,

    pub property: Property,
    pub expected: Value,
    pub actual: Value,
    pub severity: Severity,

    /// Human-readable description
    pub message: String,

    /// Set after correction
    pub outcome: Option<Outcome>,

    /// Why the outcome is what it is (winning rule, write error, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Violation {
    pub(crate) fn new(
        rule: &Rule,
        check_index: usize,
        path: ElementPath,
        expected: Value,
        actual: Value,
    ) -> Self {
        let check = &rule.checks[check_index];
        let message = format!(
            "{} of {} at {} is {}, expected {}",
            check.property, path.kind, path, actual, expected
        );
        Self {
            id: 0,
            rule_id: rule.id.clone(),
            scope: rule.scope.clone(),
            check_index,
            path,
            property: check.property,
            expected,
            actual,
            severity: check.severity,
            message,
            outcome: None,
            detail: None,
        }
    }

    /// Identity of the failing check, stable across passes.
    pub fn key(&self) -> (&str, ElementPath, usize) {
        (&self.rule_id, self.path, self.check_index)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Whether the violation still needs a human after correction.
    pub fn needs_review(&self) -> bool {
        matches!(
            self.outcome,
            Some(Outcome::FixFailed) | Some(Outcome::FixIneffective)
        )
    }

    pub(crate) fn resolve(&mut self, outcome: Outcome, detail: Option<String>) {
        self.outcome = Some(outcome);
        self.detail = detail;
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.rule_id, self.message)?;
        if let Some(outcome) = self.outcome {
            write!(f, " ({})", outcome)?;
        }
        Ok(())
    }
}

/// Final disposition of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The fix was applied and re-validation confirms it
    Fixed,
    /// A higher-priority rule set the same property to another value
    Overridden,
    /// No fix could be applied
    FixFailed,
    /// A fix was applied but the check still fails
    FixIneffective,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Fixed => "fixed",
            Outcome::Overridden => "overridden",
            Outcome::FixFailed => "fix_failed",
            Outcome::FixIneffective => "fix_ineffective",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementKind;
    use crate::rules::{Check, Selector};

    #[test]
    fn test_violation_message_and_json() {
        let rule = Rule::new("COVER", Selector::new(ElementKind::Paragraph))
            .scope("cover")
            .check(Check::new(Property::FontSize, Value::Number(14.0)));
        let mut v = Violation::new(
            &rule,
            0,
            ElementPath::paragraph(0, 0),
            Value::Number(14.0),
            Value::Number(11.0),
        );
        assert_eq!(v.message, "font_size of paragraph at s0/b0 is 11, expected 14");
        assert!(v.is_error());

        v.resolve(Outcome::Fixed, None);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["element_path"], "s0/b0");
        assert_eq!(json["outcome"], "fixed");
        assert_eq!(json["property"], "font_size");
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_needs_review() {
        let rule = Rule::new("R", Selector::new(ElementKind::Run))
            .check(Check::new(Property::Bold, Value::Bool(true)));
        let mut v = Violation::new(
            &rule,
            0,
            ElementPath::paragraph(0, 0).run(0),
            Value::Bool(true),
            Value::Bool(false),
        );
        assert!(!v.needs_review());
        v.resolve(Outcome::FixIneffective, Some("still false".into()));
        assert!(v.needs_review());
        assert!(v.to_string().ends_with("(fix_ineffective)"));
    }
}
