//! Property checks and comparators.

use super::{Property, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default tolerance for measurement comparisons (cm for lengths, pt for font size).
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Slack added to every tolerance so that a difference of exactly the
/// tolerance passes despite binary rounding.
const EPSILON: f64 = 1e-9;

/// A single property assertion within a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    /// Property to read
    pub property: Property,

    /// Value the property must have
    pub expected: Value,

    /// How actual and expected are compared
    pub comparator: Comparator,

    /// Severity of a failure
    pub severity: Severity,
}

impl Check {
    /// Create a check with the comparator the property calls for by default.
    pub fn new(property: Property, expected: Value) -> Self {
        Self {
            property,
            expected,
            comparator: Comparator::default_for(property, DEFAULT_TOLERANCE),
            severity: Severity::Error,
        }
    }

    /// Override the comparator.
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Whether an actual value satisfies the check.
    pub fn accepts(&self, actual: &Value) -> bool {
        self.comparator.compare(&self.expected, actual)
    }
}

/// Comparison strategy for a check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparator {
    /// Structural equality
    Equals,
    /// Numeric equality within a tolerance
    Approx { tolerance: f64 },
    /// The actual text already satisfies the expected case transform
    Case,
}

impl Comparator {
    /// The comparator used when a check does not name one.
    pub fn default_for(property: Property, tolerance: f64) -> Self {
        if property == Property::TextCase {
            Comparator::Case
        } else if property.is_measurement() {
            Comparator::Approx { tolerance }
        } else {
            Comparator::Equals
        }
    }

    /// Whether the comparator can be used with a property.
    pub fn supports(self, property: Property) -> bool {
        match self {
            Comparator::Equals => property != Property::TextCase,
            Comparator::Approx { .. } => property.is_measurement(),
            Comparator::Case => property == Property::TextCase,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Equals => "equals",
            Comparator::Approx { .. } => "approx",
            Comparator::Case => "case",
        }
    }

    /// Compare an actual value against the expected one.
    ///
    /// A mixed or null actual value never satisfies a comparator.
    pub fn compare(self, expected: &Value, actual: &Value) -> bool {
        match (self, expected, actual) {
            (_, _, Value::Null) | (_, _, Value::Mixed(_)) => false,
            (Comparator::Equals, Value::Alignment(e), Value::Alignment(a)) => {
                e.effective() == a.effective()
            }
            (Comparator::Equals, Value::Number(e), Value::Number(a)) => (e - a).abs() <= EPSILON,
            (Comparator::Equals, e, a) => e == a,
            (Comparator::Approx { tolerance }, Value::Number(e), Value::Number(a)) => {
                (e - a).abs() <= tolerance + EPSILON
            }
            (Comparator::Case, Value::Case(case), Value::Text(text)) => case.is_satisfied_by(text),
            _ => false,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Approx { tolerance } => write!(f, "approx(±{})", tolerance),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Severity of a failed check.
///
/// Warnings are reported but never block completion.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Alignment;
    use crate::rules::TextCase;

    #[test]
    fn test_default_comparators() {
        assert_eq!(
            Check::new(Property::RowHeight, Value::Number(0.37)).comparator,
            Comparator::Approx { tolerance: 0.01 }
        );
        assert_eq!(
            Check::new(Property::TextCase, Value::Case(TextCase::Upper)).comparator,
            Comparator::Case
        );
        assert_eq!(
            Check::new(Property::Bold, Value::Bool(true)).comparator,
            Comparator::Equals
        );
    }

    #[test]
    fn test_tolerance() {
        let check = Check::new(Property::RowHeight, Value::Number(0.37));
        assert!(check.accepts(&Value::Number(0.369)));
        assert!(check.accepts(&Value::Number(0.38)));
        assert!(!check.accepts(&Value::Number(0.30)));
        assert!(!check.accepts(&Value::Null));
    }

    #[test]
    fn test_alignment_equality_uses_effective_value() {
        let check = Check::new(Property::Alignment, Value::Alignment(Alignment::Left));
        assert!(check.accepts(&Value::Alignment(Alignment::Unset)));
        assert!(!check.accepts(&Value::Alignment(Alignment::Center)));
    }

    #[test]
    fn test_mixed_never_passes() {
        let check = Check::new(Property::Bold, Value::Bool(true));
        assert!(!check.accepts(&Value::Mixed(vec![Value::Bool(true), Value::Bool(false)])));
    }

    #[test]
    fn test_case_comparator() {
        let check = Check::new(Property::TextCase, Value::Case(TextCase::Upper));
        assert!(check.accepts(&Value::Text("ABC".into())));
        assert!(!check.accepts(&Value::Text("ABC Corp".into())));
    }

    #[test]
    fn test_comparator_support() {
        assert!(Comparator::Case.supports(Property::TextCase));
        assert!(!Comparator::Case.supports(Property::FontName));
        assert!(!Comparator::Approx { tolerance: 0.1 }.supports(Property::Bold));
        assert!(!Comparator::Equals.supports(Property::TextCase));
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Error < Severity::Warning);
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!(Severity::default(), Severity::Error);
    }
}
