//! Corrector: applies fix actions for violations.
//!
//! Contention is decided per stored value, not per selected element: a
//! paragraph rule and a run rule that both set a font size meet on the
//! runs, a row rule and a cell rule that both set a height meet on the row.
//! For each stored value the contending fixes come from every admitted rule
//! whose selected elements cover it and that has a fix for the property,
//! including rules whose own checks passed. The highest priority wins, ties
//! go to the rule that comes first in the ruleset, and the winning value is
//! written exactly once. A violation whose rule loses on any of its stored
//! values is overridden.

use super::select::select;
use super::{EngineOptions, Outcome, Violation};
use crate::model::{Document, Element, ElementKind, ElementPath};
use crate::rules::{Property, Rule, Ruleset, Value};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A property write performed by the corrector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedFix {
    /// Rule whose value was written
    pub rule_id: String,

    /// Element written to
    #[serde(rename = "element_path")]
    pub path: ElementPath,

    pub property: Property,
    pub value: Value,
}

/// Result of a correction pass.
#[derive(Debug, Clone)]
pub struct Correction {
    /// The corrected document
    pub document: Document,

    /// Input violations with a tentative outcome set
    pub violations: Vec<Violation>,

    /// Writes in application order
    pub applied: Vec<AppliedFix>,
}

/// Applies fixes from a ruleset.
#[derive(Debug, Clone)]
pub struct Corrector<'r> {
    ruleset: &'r Ruleset,
    options: EngineOptions,
}

struct Contender<'a> {
    rule: &'a Rule,
    position: usize,
    value: Value,
}

/// Contenders per stored value, best first.
type Contenders<'a> = HashMap<(Property, ElementPath), Vec<Contender<'a>>>;

impl<'r> Corrector<'r> {
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

    /// Correct a document for the given violations.
    ///
    /// A fix that cannot be applied marks its violation `fix_failed` and the
    /// pass continues. `Fixed` outcomes are tentative until re-validation.
    pub fn correct(&self, mut document: Document, mut violations: Vec<Violation>) -> Correction {
        let mut applied = Vec::new();
        if violations.is_empty() {
            return Correction {
                document,
                violations,
                applied,
            };
        }

        let contenders = self.contenders(&document, &violations);

        // stored value -> violations waiting for it to be written
        let mut dirty: BTreeMap<(ElementPath, Property), Vec<usize>> = BTreeMap::new();
        let mut pending = Vec::new();

        for (i, v) in violations.iter_mut().enumerate() {
            let property = v.property;
            let Some(own) = self.ruleset.rule(&v.rule_id).and_then(|r| r.fix_for(property))
            else {
                log::debug!("{}: no fix action for {} at {}", v.rule_id, property, v.path);
                v.resolve(
                    Outcome::FixFailed,
                    Some(format!("no fix action for {}", property)),
                );
                continue;
            };

            let locations = property.storage(&document, &v.path);
            if locations.is_empty() {
                // Nothing stores the property here; the write reports why
                match write(&mut document, &v.path, property, &own, true) {
                    Ok(()) => {
                        applied.push(AppliedFix {
                            rule_id: v.rule_id.clone(),
                            path: v.path,
                            property,
                            value: own,
                        });
                        v.resolve(Outcome::Fixed, None);
                    }
                    Err(reason) => {
                        log::warn!(
                            "Could not set {} at {} for rule '{}': {}",
                            property,
                            v.path,
                            v.rule_id,
                            reason
                        );
                        v.resolve(Outcome::FixFailed, Some(reason));
                    }
                }
                continue;
            }

            let overriding = locations.iter().find_map(|location| {
                contenders
                    .get(&(property, *location))
                    .and_then(|list| list.first())
                    .filter(|w| w.rule.id != v.rule_id && w.value != own)
            });
            if let Some(w) = overriding {
                log::debug!(
                    "{}: {}={} at {} overridden by '{}' ({})",
                    v.rule_id,
                    property,
                    own,
                    v.path,
                    w.rule.id,
                    w.value
                );
                v.resolve(
                    Outcome::Overridden,
                    Some(format!(
                        "overridden by rule '{}' (priority {}): {}={}",
                        w.rule.id,
                        display_priority(w.rule.priority),
                        property,
                        w.value
                    )),
                );
                continue;
            }

            for location in locations {
                dirty.entry((location, property)).or_default().push(i);
            }
            pending.push(i);
        }

        // Each stored value is written once, in document order
        let mut failures: HashMap<usize, String> = HashMap::new();
        for ((location, property), indices) in dirty {
            let Some(winner) = contenders
                .get(&(property, location))
                .and_then(|list| list.first())
            else {
                for i in indices {
                    failures.insert(i, format!("no fix action for {}", property));
                }
                continue;
            };
            let at_word_start = word_start_before(&document, &location);
            match write(&mut document, &location, property, &winner.value, at_word_start) {
                Ok(()) => applied.push(AppliedFix {
                    rule_id: winner.rule.id.clone(),
                    path: location,
                    property,
                    value: winner.value.clone(),
                }),
                Err(reason) => {
                    log::warn!(
                        "Could not set {} at {} for rule '{}': {}",
                        property,
                        location,
                        winner.rule.id,
                        reason
                    );
                    for i in indices {
                        failures.entry(i).or_insert_with(|| reason.clone());
                    }
                }
            }
        }

        for i in pending {
            match failures.remove(&i) {
                Some(reason) => violations[i].resolve(Outcome::FixFailed, Some(reason)),
                None => violations[i].resolve(Outcome::Fixed, None),
            }
        }

        Correction {
            document,
            violations,
            applied,
        }
    }

    /// Fixes of every admitted rule for the violated properties, keyed by the
    /// stored values its selected elements cover on the uncorrected document.
    fn contenders(&self, document: &Document, violations: &[Violation]) -> Contenders<'r> {
        let properties: BTreeSet<Property> = violations.iter().map(|v| v.property).collect();
        let mut contenders: Contenders<'r> = HashMap::new();

        for (position, rule) in self.ruleset.enabled_rules() {
            if !self.options.admits(rule) {
                continue;
            }
            let fixes: Vec<(Property, Value)> = properties
                .iter()
                .filter_map(|&p| rule.fix_for(p).map(|value| (p, value)))
                .collect();
            if fixes.is_empty() {
                continue;
            }
            for path in select(document, &rule.selector) {
                for (property, value) in &fixes {
                    for location in property.storage(document, &path) {
                        contenders
                            .entry((*property, location))
                            .or_default()
                            .push(Contender {
                                rule,
                                position,
                                value: value.clone(),
                            });
                    }
                }
            }
        }

        for list in contenders.values_mut() {
            list.sort_by_key(|c| (Reverse(c.rule.priority), c.position));
            // One rule can reach a stored value through several elements
            list.dedup_by_key(|c| c.position);
        }
        contenders
    }
}

fn write(
    document: &mut Document,
    path: &ElementPath,
    property: Property,
    value: &Value,
    at_word_start: bool,
) -> Result<(), String> {
    match document.resolve_mut(path) {
        Some(mut element) => property
            .write_continuing(&mut element, value, at_word_start)
            .map_err(|e| e.to_string()),
        None => Err(format!("element {} does not exist", path)),
    }
}

/// Whether the run at `path` starts a word, given the runs before it.
fn word_start_before(document: &Document, path: &ElementPath) -> bool {
    let Some(run) = path.run else {
        return true;
    };
    let paragraph = ElementPath {
        run: None,
        kind: ElementKind::Paragraph,
        ..*path
    };
    match document.resolve(&paragraph) {
        Some(Element::Paragraph(p)) => p
            .runs
            .get(..run)
            .unwrap_or_default()
            .iter()
            .rev()
            .find_map(|r| r.text.chars().last())
            .map_or(true, char::is_whitespace),
        _ => true,
    }
}

fn display_priority(priority: i64) -> String {
    if priority == i64::MIN {
        "none".to_string()
    } else {
        priority.to_string()
    }
}

/// Correct a document for the given violations with every enabled rule.
pub fn correct(
    document: Document,
    violations: Vec<Violation>,
    ruleset: &Ruleset,
) -> (Document, Vec<Violation>) {
    let correction = Corrector::new(ruleset).correct(document, violations);
    (correction.document, correction.violations)
}
