//! Assertion evaluator.

use crate::model::{Document, Element, ElementPath};
use crate::rules::{Check, Reading, Value};
use serde::Serialize;

/// Result of evaluating one check against one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assertion {
    /// Whether the check holds
    pub passed: bool,

    /// The value read from the element
    pub actual: Value,
}

/// Evaluate a check against the element at `path`.
///
/// A path that no longer resolves fails with a null actual value.
pub fn evaluate(document: &Document, path: &ElementPath, check: &Check) -> Assertion {
    match document.resolve(path) {
        Some(element) => evaluate_element(&element, check),
        None => Assertion {
            passed: false,
            actual: Value::Null,
        },
    }
}

/// Evaluate a check against a resolved element. Side-effect free.
pub fn evaluate_element(element: &Element<'_>, check: &Check) -> Assertion {
    match check.property.read(element) {
        Reading::Value(actual) => Assertion {
            passed: check.accepts(&actual),
            actual,
        },
        // nothing to check
        Reading::Vacuous => Assertion {
            passed: true,
            actual: Value::Null,
        },
        Reading::NotApplicable => Assertion {
            passed: false,
            actual: Value::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Run, Section, Table, TableRow};
    use crate::rules::{Property, TextCase};

    fn doc() -> Document {
        Document::new().section(
            Section::new()
                .paragraph(Paragraph::new().run(Run::new("ABC Corp").font("Calibri", 11.0)))
                .paragraph(Paragraph::new())
                .table(Table::new().row(TableRow::from_strings(["a", "b"]).height(0.369))),
        )
    }

    #[test]
    fn test_evaluate_pass_and_fail() {
        let doc = doc();
        let para = ElementPath::paragraph(0, 0);

        let a = evaluate(&doc, &para, &Check::new(Property::FontSize, Value::Number(11.0)));
        assert!(a.passed);

        let a = evaluate(&doc, &para, &Check::new(Property::FontSize, Value::Number(14.0)));
        assert!(!a.passed);
        assert_eq!(a.actual, Value::Number(11.0));
    }

    #[test]
    fn test_row_height_tolerance() {
        let doc = doc();
        let row = ElementPath::table(0, 2).row(0);
        assert!(evaluate(&doc, &row, &Check::new(Property::RowHeight, Value::Number(0.37))).passed);
        assert!(!evaluate(&doc, &row, &Check::new(Property::RowHeight, Value::Number(0.30))).passed);
    }

    #[test]
    fn test_case_check_on_run() {
        let doc = doc();
        let run = ElementPath::paragraph(0, 0).run(0);
        let a = evaluate(&doc, &run, &Check::new(Property::TextCase, Value::Case(TextCase::Upper)));
        assert!(!a.passed);
        assert_eq!(a.actual, Value::Text("ABC Corp".into()));
    }

    #[test]
    fn test_vacuous_and_not_applicable() {
        let doc = doc();
        let empty = ElementPath::paragraph(0, 1);
        assert!(evaluate(&doc, &empty, &Check::new(Property::Bold, Value::Bool(true))).passed);

        let para = ElementPath::paragraph(0, 0);
        let a = evaluate(&doc, &para, &Check::new(Property::RowHeight, Value::Number(0.37)));
        assert!(!a.passed);
        assert_eq!(a.actual, Value::Null);
    }

    #[test]
    fn test_unresolvable_path() {
        let doc = doc();
        let gone = ElementPath::paragraph(3, 0);
        assert!(!evaluate(&doc, &gone, &Check::new(Property::Bold, Value::Bool(false))).passed);
    }
}
