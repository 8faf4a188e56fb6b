//! The validate, correct, re-validate pipeline.

use super::{Corrector, EngineOptions, Outcome, Validator, Violation};
use crate::model::{Document, ElementPath};
use crate::report::Report;
use crate::rules::{Ruleset, Value};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Output of a full processing pass.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// The corrected document
    pub document: Document,

    /// Report of the pass
    pub report: Report,
}

/// Runs rulesets over documents.
///
/// The engine borrows its ruleset and holds no other state, so one ruleset
/// can serve any number of engines on any number of threads.
#[derive(Debug, Clone)]
pub struct Engine<'r> {
    ruleset: &'r Ruleset,
    options: EngineOptions,
}

impl<'r> Engine<'r> {
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

    pub fn ruleset(&self) -> &'r Ruleset {
        self.ruleset
    }

    /// Validate without correcting.
    pub fn validate(&self, document: &Document) -> Report {
        let start = Instant::now();
        let validation = self.validator().validate(document);
        Report::build(
            self.ruleset.version(),
            validation.elements_checked,
            validation.rules_evaluated,
            validation.violations,
            Vec::new(),
            start.elapsed(),
        )
    }

    /// Validate, correct and re-validate a document.
    ///
    /// Re-validation always runs: fixes whose check still fails become
    /// `fix_ineffective`, and violations that only appear after correction
    /// are reported as introduced.
    pub fn process(&self, document: Document) -> ProcessOutput {
        let start = Instant::now();
        let validator = self.validator();

        let initial = validator.validate(&document);
        let correction = Corrector::new(self.ruleset)
            .with_options(self.options.clone())
            .correct(document, initial.violations);
        log::debug!("Applied {} fixes", correction.applied.len());

        let after = validator.validate(&correction.document);
        let (violations, introduced) = reconcile(correction.violations, after.violations);

        let report = Report::build(
            self.ruleset.version(),
            initial.elements_checked,
            initial.rules_evaluated,
            violations,
            introduced,
            start.elapsed(),
        );
        log::info!(
            "Processed document: {} found, {} fixed, status {}",
            report.summary.found,
            report.summary.fixed,
            report.status
        );

        ProcessOutput {
            document: correction.document,
            report,
        }
    }

    fn validator(&self) -> Validator<'r> {
        Validator::new(self.ruleset).with_options(self.options.clone())
    }
}

/// Settle tentative outcomes against the re-validation result.
///
/// Returns the settled violations and those present only after correction.
fn reconcile(
    mut violations: Vec<Violation>,
    after: Vec<Violation>,
) -> (Vec<Violation>, Vec<Violation>) {
    let remaining: HashMap<(&str, ElementPath, usize), &Value> =
        after.iter().map(|v| (v.key(), &v.actual)).collect();

    for v in violations.iter_mut() {
        if v.outcome != Some(Outcome::Fixed) {
            continue;
        }
        if let Some(actual) = remaining.get(&v.key()) {
            log::warn!(
                "Fix for rule '{}' did not take effect: {} at {} is still {}",
                v.rule_id,
                v.property,
                v.path,
                actual
            );
            let detail = format!("{} is still {} after the fix", v.property, actual);
            v.resolve(Outcome::FixIneffective, Some(detail));
        }
    }

    let initial: HashSet<(&str, ElementPath, usize)> = violations.iter().map(|v| v.key()).collect();
    let introduced: Vec<Violation> = after
        .iter()
        .filter(|v| !initial.contains(&v.key()))
        .cloned()
        .collect();
    for v in &introduced {
        log::warn!("Correction introduced a violation: {}", v);
    }

    (violations, introduced)
}

/// Process independent documents in parallel against one shared ruleset.
///
/// Output order matches input order.
pub fn process_batch(
    documents: Vec<Document>,
    ruleset: &Ruleset,
    options: &EngineOptions,
) -> Vec<ProcessOutput> {
    documents
        .into_par_iter()
        .map(|document| {
            Engine::new(ruleset)
                .with_options(options.clone())
                .process(document)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementKind, Paragraph, Run, Section};
    use crate::report::Status;
    use crate::rules::{Check, FixAction, Property, Rule, Selector, TextCase};

    fn doc(text: &str) -> Document {
        Document::new().section(
            Section::new().paragraph(Paragraph::new().run(Run::new(text).font("Calibri", 11.0))),
        )
    }

    #[test]
    fn test_ineffective_fix_detected() {
        // The fix writes a size the check does not accept
        let rule = Rule::new("R", Selector::new(ElementKind::Paragraph))
            .check(Check::new(Property::FontSize, Value::Number(16.0)))
            .fix(FixAction::SetFont {
                name: None,
                size: Some(14.0),
            });
        let rs = Ruleset::new("1", vec![rule]).unwrap();

        let output = Engine::new(&rs).process(doc("Title"));
        let v = &output.report.violations[0];
        assert_eq!(v.outcome, Some(Outcome::FixIneffective));
        assert_eq!(v.detail.as_deref(), Some("font_size is still 14 after the fix"));
        assert_eq!(output.report.summary.fix_ineffective, 1);
        assert_eq!(output.report.status, Status::NeedsReview);
        assert!(output.report.introduced.is_empty());
    }

    #[test]
    fn test_introduced_violation() {
        // Upper-casing the text makes the title-case rule fail
        let rs = Ruleset::new(
            "1",
            vec![
                Rule::new("UPPER", Selector::new(ElementKind::Paragraph).containing("corp"))
                    .check(Check::new(Property::TextCase, Value::Case(TextCase::Upper)))
                    .fix(FixAction::SetTextCase(TextCase::Upper)),
                Rule::new("TITLE", Selector::new(ElementKind::Run))
                    .check(Check::new(Property::TextCase, Value::Case(TextCase::Title))),
            ],
        )
        .unwrap();

        let output = Engine::new(&rs).process(doc("Abc Corp"));
        assert_eq!(output.report.summary.fixed, 1);
        assert_eq!(output.report.introduced.len(), 1);
        assert_eq!(output.report.introduced[0].rule_id, "TITLE");
    }

    #[test]
    fn test_clean_document() {
        let rs = Ruleset::new(
            "1",
            vec![Rule::new("R", Selector::new(ElementKind::Paragraph))
                .check(Check::new(Property::Bold, Value::Bool(false)))],
        )
        .unwrap();
        let output = Engine::new(&rs).process(doc("Body"));
        assert_eq!(output.report.status, Status::Clean);
        assert_eq!(output.document, doc("Body"));
    }

    #[test]
    fn test_process_batch_keeps_order() {
        let rs = Ruleset::new(
            "1",
            vec![Rule::new("BOLD", Selector::new(ElementKind::Paragraph))
                .check(Check::new(Property::Bold, Value::Bool(true)))
                .fix(FixAction::SetBold(true))],
        )
        .unwrap();
        let docs: Vec<Document> = (0..8).map(|i| doc(&format!("Doc {}", i))).collect();
        let outputs = process_batch(docs, &rs, &EngineOptions::default());
        assert_eq!(outputs.len(), 8);
        for (i, output) in outputs.iter().enumerate() {
            assert_eq!(output.document.plain_text(), format!("Doc {}", i));
            assert_eq!(output.report.status, Status::Corrected);
        }
    }
}
