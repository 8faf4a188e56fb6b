//! Validator: runs every rule's checks over the elements it selects.

use super::evaluate::evaluate_element;
use super::select::select_located;
use super::{EngineOptions, Violation};
use crate::model::{Document, ElementPath};
use crate::rules::Ruleset;
use std::collections::BTreeSet;

/// Result of a validation pass.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// Violations grouped by rule order, then element order, then check order
    pub violations: Vec<Violation>,

    /// Distinct elements selected by at least one rule
    pub elements_checked: usize,

    /// Rules that took part in the pass
    pub rules_evaluated: usize,

    /// Ids of rules whose selector matched nothing
    pub empty_selectors: Vec<String>,
}

impl Validation {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of error-severity violations.
    pub fn error_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_error()).count()
    }
}

/// Validates documents against a ruleset.
///
/// Rules are independent: no rule's result influences another's, so the
/// same document and ruleset always give the same violation list.
#[derive(Debug, Clone)]
pub struct Validator<'r> {
    ruleset: &'r Ruleset,
    options: EngineOptions,
}

impl<'r> Validator<'r> {
    pub fn new(ruleset: &'r Ruleset) -> Self {
        Self {
            ruleset,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Run all admitted rules over a document.
    pub fn validate(&self, document: &Document) -> Validation {
        let mut validation = Validation::default();
        let mut checked: BTreeSet<ElementPath> = BTreeSet::new();

        for rule in self.ruleset.rules() {
            if !self.options.admits(rule) {
                continue;
            }
            validation.rules_evaluated += 1;

            let selected = select_located(document, &rule.selector);
            if selected.is_empty() {
                log::debug!("Rule '{}' matched no {} elements", rule.id, rule.selector.element);
                validation.empty_selectors.push(rule.id.clone());
                continue;
            }

            for located in &selected {
                checked.insert(located.path);
                for (index, check) in rule.checks.iter().enumerate() {
                    if !self.options.admits_severity(check.severity) {
                        continue;
                    }
                    let assertion = evaluate_element(&located.element, check);
                    if !assertion.passed {
                        validation.violations.push(Violation::new(
                            rule,
                            index,
                            located.path,
                            check.expected.clone(),
                            assertion.actual,
                        ));
                    }
                }
            }
        }

        for (i, violation) in validation.violations.iter_mut().enumerate() {
            violation.id = i + 1;
        }
        validation.elements_checked = checked.len();

        log::debug!(
            "Validated {} elements against {} rules: {} violations",
            validation.elements_checked,
            validation.rules_evaluated,
            validation.violations.len()
        );
        validation
    }
}

/// Validate a document against every enabled rule of a ruleset.
pub fn validate(document: &Document, ruleset: &Ruleset) -> Vec<Violation> {
    Validator::new(ruleset).validate(document).violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, ElementKind, Paragraph, Run, Section};
    use crate::rules::{Check, Property, Rule, Selector, Severity, Value};

    fn doc() -> Document {
        Document::new().section(
            Section::new()
                .paragraph(Paragraph::new().run(Run::new("Cover title").font("Calibri", 11.0)))
                .paragraph(Paragraph::new().run(Run::new("Body").font("Arial", 11.0))),
        )
    }

    fn ruleset() -> Ruleset {
        Ruleset::new(
            "1",
            vec![
                Rule::new("FONT", Selector::new(ElementKind::Paragraph))
                    .scope("body")
                    .check(Check::new(Property::FontName, Value::Text("Arial".into())))
                    .check(Check::new(Property::FontSize, Value::Number(12.0))),
                Rule::new(
                    "TITLE",
                    Selector::new(ElementKind::Paragraph).containing("title"),
                )
                .scope("cover")
                .check(
                    Check::new(Property::Alignment, Value::Alignment(Alignment::Center))
                        .with_severity(Severity::Warning),
                ),
                Rule::new("FOOTNOTE", Selector::new(ElementKind::Paragraph).containing("¹"))
                    .check(Check::new(Property::Italic, Value::Bool(true))),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_violation_order() {
        let validation = Validator::new(&ruleset()).validate(&doc());
        let keys: Vec<(String, String, usize)> = validation
            .violations
            .iter()
            .map(|v| (v.rule_id.clone(), v.path.to_string(), v.check_index))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("FONT".into(), "s0/b0".into(), 0),
                ("FONT".into(), "s0/b0".into(), 1),
                ("FONT".into(), "s0/b1".into(), 1),
                ("TITLE".into(), "s0/b0".into(), 0),
            ]
        );
        let ids: Vec<usize> = validation.violations.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(validation.elements_checked, 2);
        assert_eq!(validation.rules_evaluated, 3);
        assert_eq!(validation.empty_selectors, vec!["FOOTNOTE".to_string()]);
        assert_eq!(validation.error_count(), 3);
    }

    #[test]
    fn test_deterministic() {
        let rs = ruleset();
        let doc = doc();
        assert_eq!(validate(&doc, &rs), validate(&doc, &rs));
    }

    #[test]
    fn test_scope_and_severity_filters() {
        let rs = ruleset();
        let cover_only = Validator::new(&rs)
            .with_options(EngineOptions::new().with_scope("cover"))
            .validate(&doc());
        assert_eq!(cover_only.violations.len(), 1);
        assert_eq!(cover_only.rules_evaluated, 1);

        let errors_only = Validator::new(&rs)
            .with_options(EngineOptions::new().skip_warnings())
            .validate(&doc());
        assert!(errors_only.violations.iter().all(|v| v.is_error()));
        assert_eq!(errors_only.violations.len(), 3);
    }

    #[test]
    fn test_empty_document_is_clean() {
        let validation = Validator::new(&ruleset()).validate(&Document::new());
        assert!(validation.is_clean());
        assert_eq!(validation.elements_checked, 0);
    }
}
